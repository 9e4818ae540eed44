#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use events_rewards_backend::config::LuckyDrawConfig;
use events_rewards_backend::database::{TxnTimeouts, run_migrations};
use events_rewards_backend::entities::reward_entity as rewards;
use events_rewards_backend::services::{ClaimService, LuckyDrawService};
use events_rewards_backend::utils::{Clock, OsRandom, RandomSource};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// 单连接内存 SQLite, 多连接会各自拿到一个空库
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    run_migrations(&db).await.expect("run migrations");
    db
}

/// 2025-03-10 06:00 UTC = 11:30 IST
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
}

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// 按队列返回预设值, 队列耗尽后退回到系统随机源
#[derive(Default)]
pub struct SequenceRandom {
    units: Mutex<VecDeque<f64>>,
    bytes: Mutex<VecDeque<Vec<u8>>>,
}

impl SequenceRandom {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_unit(&self, unit: f64) {
        self.units.lock().unwrap().push_back(unit);
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.bytes.lock().unwrap().push_back(bytes.to_vec());
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&self) -> f64 {
        match self.units.lock().unwrap().pop_front() {
            Some(unit) => unit,
            None => OsRandom.next_unit(),
        }
    }

    fn fill_bytes(&self, dest: &mut [u8]) {
        match self.bytes.lock().unwrap().pop_front() {
            Some(bytes) => dest.copy_from_slice(&bytes[..dest.len()]),
            None => OsRandom.fill_bytes(dest),
        }
    }
}

pub struct RewardSeed<'a> {
    pub name: &'a str,
    pub reward_type: Option<&'a str>,
    pub probability: f64,
    pub total_available: Option<i32>,
    pub total_claimed: i32,
    pub is_active: bool,
}

impl<'a> RewardSeed<'a> {
    pub fn real(name: &'a str, probability: f64) -> Self {
        Self {
            name,
            reward_type: Some("voucher"),
            probability,
            total_available: None,
            total_claimed: 0,
            is_active: true,
        }
    }

    pub fn no_prize(name: &'a str, probability: f64) -> Self {
        Self {
            reward_type: Some("none"),
            ..Self::real(name, probability)
        }
    }

    pub fn capped(mut self, total_available: i32, total_claimed: i32) -> Self {
        self.total_available = Some(total_available);
        self.total_claimed = total_claimed;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

pub async fn seed_reward(db: &DatabaseConnection, seed: RewardSeed<'_>) -> rewards::Model {
    let now = base_time();
    rewards::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(seed.name.to_string()),
        description: Set(None),
        reward_type: Set(seed.reward_type.map(str::to_string)),
        value: Set(Some(100.0)),
        probability: Set(seed.probability),
        total_available: Set(seed.total_available),
        total_claimed: Set(seed.total_claimed),
        is_active: Set(seed.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed reward")
}

pub struct Harness {
    pub db: DatabaseConnection,
    pub clock: Arc<FixedClock>,
    pub rng: Arc<SequenceRandom>,
    pub lucky_draw: LuckyDrawService,
    pub claims: ClaimService,
}

pub async fn harness() -> Harness {
    harness_with(LuckyDrawConfig::default()).await
}

pub async fn harness_with(config: LuckyDrawConfig) -> Harness {
    let db = setup_db().await;
    let clock = FixedClock::new(base_time());
    let rng = SequenceRandom::new();

    let lucky_draw = LuckyDrawService::new(db.clone(), &config, TxnTimeouts::default())
        .expect("valid config")
        .with_sources(clock.clone(), rng.clone());
    let claims = ClaimService::new(db.clone(), TxnTimeouts::default()).with_clock(clock.clone());

    Harness {
        db,
        clock,
        rng,
        lucky_draw,
        claims,
    }
}
