use crate::entities::spin_attempt_entity as spins;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

/// 单次登记结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub allowed: bool,
    /// 登记后当日已用次数
    pub attempts_used: i32,
}

/// 每日抽奖次数账本
///
/// 所有状态都在数据库中, 多副本部署时依赖行锁保证上限:
/// 1. `INSERT ... ON CONFLICT (user_id, attempt_date) DO NOTHING` 创建当日首条记录
/// 2. 记录已存在时 `UPDATE ... WHERE attempts_count < limit` 条件递增
///
/// 必须在调用方的事务中执行, 事务回滚时本次登记一并撤销。
#[derive(Debug, Clone, Copy)]
pub struct SpinLedger {
    daily_limit: i32,
}

impl SpinLedger {
    pub fn new(daily_limit: i32) -> Self {
        Self { daily_limit }
    }

    pub fn daily_limit(&self) -> i32 {
        self.daily_limit
    }

    pub async fn register_attempt<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AttemptOutcome, DbErr> {
        // 当日首次：直接插入 attempts_count = 1
        let inserted = spins::Entity::insert(spins::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            attempt_date: Set(day),
            attempts_count: Set(1),
            last_attempt: Set(now),
        })
        .on_conflict(
            OnConflict::columns([spins::Column::UserId, spins::Column::AttemptDate])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

        if inserted == 1 {
            return Ok(AttemptOutcome {
                allowed: true,
                attempts_used: 1,
            });
        }

        // 已有记录：仅在未达上限时递增
        let updated = spins::Entity::update_many()
            .col_expr(
                spins::Column::AttemptsCount,
                Expr::col(spins::Column::AttemptsCount).add(1),
            )
            .col_expr(spins::Column::LastAttempt, Expr::value(now))
            .filter(spins::Column::UserId.eq(user_id))
            .filter(spins::Column::AttemptDate.eq(day))
            .filter(spins::Column::AttemptsCount.lt(self.daily_limit))
            .exec(db)
            .await?;

        let current = self
            .usage_on(db, user_id, day)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("spin_attempts row vanished".into()))?;

        Ok(AttemptOutcome {
            allowed: updated.rows_affected == 1,
            attempts_used: current.attempts_count,
        })
    }

    pub async fn usage_on<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<spins::Model>, DbErr> {
        spins::Entity::find()
            .filter(spins::Column::UserId.eq(user_id))
            .filter(spins::Column::AttemptDate.eq(day))
            .one(db)
            .await
    }

    /// `since` 起 (含) 的记录, 按日期倒序
    pub async fn history<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<spins::Model>, DbErr> {
        spins::Entity::find()
            .filter(spins::Column::UserId.eq(user_id))
            .filter(spins::Column::AttemptDate.gte(since))
            .order_by_desc(spins::Column::AttemptDate)
            .all(db)
            .await
    }

    pub fn remaining(&self, attempts_used: i32) -> i32 {
        (self.daily_limit - attempts_used).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_never_negative() {
        let ledger = SpinLedger::new(3);
        assert_eq!(ledger.remaining(0), 3);
        assert_eq!(ledger.remaining(3), 0);
        assert_eq!(ledger.remaining(5), 0);
    }
}
