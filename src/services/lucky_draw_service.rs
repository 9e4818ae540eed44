use std::sync::Arc;

use crate::config::LuckyDrawConfig;
use crate::database::{TxnTimeouts, begin_bounded, is_lock_timeout};
use crate::entities::{
    AwardStatus, RewardKind, reward_entity as rewards, spin_attempt_entity as spins,
    user_reward_entity as user_rewards,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    RemainingSpinsResponse, RewardResponse, SpinHistoryItem, SpinResponse, UserRewardStats,
};
use crate::services::{SpinLedger, reward_selector};
use crate::utils::{
    Clock, OsRandom, RandomSource, ReferenceZone, SystemClock, generate_claim_code,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

/// 限量奖品被并发抢完时, 重新抽取的最大次数
const MAX_SELECT_ATTEMPTS: usize = 5;
/// 兑奖码唯一约束冲突时的最大重试次数
const MAX_CLAIM_CODE_ATTEMPTS: usize = 5;

const LOSING_MESSAGE: &str = "Better luck next time!";

#[derive(Clone)]
pub struct LuckyDrawService {
    pool: DatabaseConnection,
    ledger: SpinLedger,
    zone: ReferenceZone,
    claim_expiry: Duration,
    history_days: i64,
    timeouts: TxnTimeouts,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
}

impl LuckyDrawService {
    pub fn new(
        pool: DatabaseConnection,
        config: &LuckyDrawConfig,
        timeouts: TxnTimeouts,
    ) -> AppResult<Self> {
        Ok(Self {
            pool,
            ledger: SpinLedger::new(config.daily_spin_limit),
            zone: ReferenceZone::from_offset_minutes(config.utc_offset_minutes)?,
            claim_expiry: Duration::days(config.claim_expiry_days),
            history_days: config.history_days,
            timeouts,
            clock: Arc::new(SystemClock),
            rng: Arc::new(OsRandom),
        })
    }

    /// 替换时间与随机源 (测试 / 回放)
    pub fn with_sources(mut self, clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        self.clock = clock;
        self.rng = rng;
        self
    }

    /// 抽奖 (Spin)
    ///
    /// 逻辑 (单个事务):
    /// 1. 登记当日次数, 超限直接返回 429
    /// 2. 读取启用、权重 > 0 且仍有库存的奖品, 为空返回 503
    /// 3. 按权重随机抽取
    /// 4. 谢谢参与: 不生成记录
    /// 5. 实际奖品: 条件递增 total_claimed (限量奖品被抢完则剔除后重抽), 并写入中奖记录
    ///
    /// 因锁等待超时失败时整体重试一次。
    pub async fn spin(&self, user_id: Uuid) -> AppResult<SpinResponse> {
        match self.spin_once(user_id).await {
            Err(AppError::DatabaseError(e)) if is_lock_timeout(&e) => {
                log::warn!("Spin for user {user_id} hit a lock timeout, retrying once: {e}");
                self.spin_once(user_id).await
            }
            other => other,
        }
    }

    async fn spin_once(&self, user_id: Uuid) -> AppResult<SpinResponse> {
        let now = self.clock.now();
        let today = self.zone.day_of(now);

        // 出错时 txn 被 drop 即回滚, 包括次数登记
        let txn = begin_bounded(&self.pool, self.timeouts).await?;

        let attempt = self
            .ledger
            .register_attempt(&txn, user_id, today, now)
            .await?;
        if !attempt.allowed {
            log::warn!(
                "User {user_id} reached daily spin limit ({}) on {today}",
                self.ledger.daily_limit()
            );
            return Err(AppError::RateLimitExceeded(
                "Daily spin limit reached".into(),
            ));
        }

        let candidates = Self::eligible_rewards(&txn).await?;
        if candidates.is_empty() {
            return Err(AppError::ServiceUnavailable("No rewards available".into()));
        }

        let selected = self.select_and_secure_reward(&txn, candidates, now).await?;
        let remaining_spins = self.ledger.remaining(attempt.attempts_used);

        let response = match selected.kind() {
            RewardKind::NoPrize => SpinResponse {
                success: true,
                reward: selected.into(),
                message: LOSING_MESSAGE.to_string(),
                claim_code: None,
                expires_at: None,
                attempts_used: attempt.attempts_used,
                remaining_spins,
            },
            RewardKind::Real { .. } => {
                let award = self.create_award(&txn, user_id, &selected, now).await?;
                SpinResponse {
                    success: true,
                    message: format!("Congratulations! You won: {}", selected.name),
                    reward: selected.into(),
                    claim_code: Some(award.claim_code),
                    expires_at: Some(award.expires_at),
                    attempts_used: attempt.attempts_used,
                    remaining_spins,
                }
            }
        };

        txn.commit().await?;

        log::info!(
            "User {user_id} spin {}/{} on {today}: {}",
            attempt.attempts_used,
            self.ledger.daily_limit(),
            response.reward.name
        );
        Ok(response)
    }

    /// 可参与抽奖的奖品, 按 id 固定顺序
    async fn eligible_rewards<C: ConnectionTrait>(db: &C) -> AppResult<Vec<rewards::Model>> {
        let list = rewards::Entity::find()
            .filter(rewards::Column::IsActive.eq(true))
            .filter(rewards::Column::Probability.gt(0.0))
            .filter(supply_remaining())
            .order_by_asc(rewards::Column::Id)
            .all(db)
            .await?;
        debug_assert!(list.iter().all(rewards::Model::is_available));
        Ok(list)
    }

    /// 选择奖品; 实际奖品在同一事务内条件递增 total_claimed
    async fn select_and_secure_reward(
        &self,
        txn: &DatabaseTransaction,
        mut candidates: Vec<rewards::Model>,
        now: DateTime<Utc>,
    ) -> AppResult<rewards::Model> {
        for _ in 0..MAX_SELECT_ATTEMPTS {
            let chosen = reward_selector::select(&candidates, self.rng.as_ref())
                .cloned()
                .ok_or_else(|| AppError::ServiceUnavailable("No rewards available".into()))?;

            if chosen.kind() == RewardKind::NoPrize {
                return Ok(chosen);
            }

            if secure_reward(txn, &chosen, now).await? {
                return Ok(rewards::Model {
                    total_claimed: chosen.total_claimed + 1,
                    updated_at: now,
                    ..chosen
                });
            }

            // 库存已被并发请求抢完, 剔除后重抽
            log::warn!("Reward {} ran out of supply during spin, reselecting", chosen.id);
            candidates.retain(|r| r.id != chosen.id);
            if candidates.is_empty() {
                return Err(AppError::ServiceUnavailable("No rewards available".into()));
            }
        }

        Err(AppError::InternalError(
            "Failed to select reward after several attempts".into(),
        ))
    }

    /// 写入中奖记录; 兑奖码冲突时回滚到保存点并换码重试
    async fn create_award(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        reward: &rewards::Model,
        now: DateTime<Utc>,
    ) -> AppResult<user_rewards::Model> {
        let expires_at = now + self.claim_expiry;

        for attempt in 1..=MAX_CLAIM_CODE_ATTEMPTS {
            let savepoint = txn.begin().await?;
            let inserted = user_rewards::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                reward_id: Set(reward.id),
                status: Set(AwardStatus::Pending),
                claim_code: Set(generate_claim_code(self.rng.as_ref())),
                expires_at: Set(expires_at),
                claimed_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&savepoint)
            .await;

            match inserted {
                Ok(award) => {
                    savepoint.commit().await?;
                    return Ok(award);
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    log::warn!("Claim code collision on attempt {attempt}, regenerating");
                    savepoint.rollback().await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::InternalError(
            "Failed to generate a unique claim code".into(),
        ))
    }

    /// 获取奖品列表（仅启用的, 按权重倒序, 不暴露权重）
    pub async fn list_rewards(&self) -> AppResult<Vec<RewardResponse>> {
        let list = rewards::Entity::find()
            .filter(rewards::Column::IsActive.eq(true))
            .order_by_desc(rewards::Column::Probability)
            .order_by_asc(rewards::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 当日剩余次数
    pub async fn remaining_spins(&self, user_id: Uuid) -> AppResult<RemainingSpinsResponse> {
        let today = self.zone.day_of(self.clock.now());
        let usage = self.ledger.usage_on(&self.pool, user_id, today).await?;

        let spins_used = usage.as_ref().map(|m| m.attempts_count).unwrap_or(0);
        let remaining = self.ledger.remaining(spins_used);

        Ok(RemainingSpinsResponse {
            remaining_spins: remaining,
            total_daily_spins: self.ledger.daily_limit(),
            spins_used_today: spins_used,
            last_spin: usage.map(|m| m.last_attempt),
            can_spin_today: remaining > 0,
            today,
        })
    }

    /// 最近 history_days 个参考日的抽奖记录（倒序）
    pub async fn spin_history(&self, user_id: Uuid) -> AppResult<Vec<SpinHistoryItem>> {
        let today = self.zone.day_of(self.clock.now());
        let since = self.zone.window_start(today, self.history_days);
        let rows = self.ledger.history(&self.pool, user_id, since).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 用户抽奖统计
    pub async fn user_stats(&self, user_id: Uuid) -> AppResult<UserRewardStats> {
        let now = self.clock.now();

        #[derive(Debug, FromQueryResult)]
        struct SumRow {
            total: Option<i64>,
        }
        let total_spins = spins::Entity::find()
            .filter(spins::Column::UserId.eq(user_id))
            .select_only()
            .column_as(Expr::col(spins::Column::AttemptsCount).sum(), "total")
            .into_model::<SumRow>()
            .one(&self.pool)
            .await?
            .and_then(|r| r.total)
            .unwrap_or(0);

        let mine = || user_rewards::Entity::find().filter(user_rewards::Column::UserId.eq(user_id));

        let total_wins = mine().count(&self.pool).await?;
        let claimed = mine()
            .filter(user_rewards::Column::Status.eq(AwardStatus::Claimed))
            .count(&self.pool)
            .await?;
        let pending = mine()
            .filter(user_rewards::Column::Status.eq(AwardStatus::Pending))
            .filter(user_rewards::Column::ExpiresAt.gte(now))
            .count(&self.pool)
            .await?;
        let expired = mine()
            .filter(user_rewards::Column::Status.eq(AwardStatus::Pending))
            .filter(user_rewards::Column::ExpiresAt.lt(now))
            .count(&self.pool)
            .await?;

        Ok(UserRewardStats {
            total_spins,
            total_wins: total_wins as i64,
            pending_rewards: pending as i64,
            claimed_rewards: claimed as i64,
            expired_rewards: expired as i64,
        })
    }
}

/// 不限量, 或已发放 < 总量
fn supply_remaining() -> Condition {
    Condition::any()
        .add(rewards::Column::TotalAvailable.is_null())
        .add(
            Expr::col(rewards::Column::TotalClaimed)
                .lt(Expr::col(rewards::Column::TotalAvailable)),
        )
}

/// 条件递增 total_claimed; 返回 false 表示库存已被其他请求抢完
pub(crate) async fn secure_reward<C: ConnectionTrait>(
    db: &C,
    reward: &rewards::Model,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let updated = rewards::Entity::update_many()
        .col_expr(
            rewards::Column::TotalClaimed,
            Expr::col(rewards::Column::TotalClaimed).add(1),
        )
        .col_expr(rewards::Column::UpdatedAt, Expr::value(now))
        .filter(rewards::Column::Id.eq(reward.id))
        .filter(supply_remaining())
        .exec(db)
        .await?;
    Ok(updated.rows_affected == 1)
}
