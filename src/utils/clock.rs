use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// 当前时间来源 (便于测试时替换)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 参考时区：所有用户共享同一个日切时刻
#[derive(Debug, Clone, Copy)]
pub struct ReferenceZone {
    offset: FixedOffset,
}

impl ReferenceZone {
    pub fn from_offset_minutes(minutes: i32) -> AppResult<Self> {
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            AppError::ConfigError(format!("Invalid UTC offset: {minutes} minutes"))
        })?;
        Ok(Self { offset })
    }

    /// 参考时区下的自然日 (按日历截断, 而非滚动 24 小时)
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// 从 `today` 往前推 `days` 天 (含当天) 的起始日
    pub fn window_start(&self, today: NaiveDate, days: i64) -> NaiveDate {
        today - Duration::days((days - 1).max(0))
    }
}
