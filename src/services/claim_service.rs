use std::sync::Arc;

use crate::database::{TxnTimeouts, begin_bounded};
use crate::entities::{AwardStatus, reward_entity as rewards, user_reward_entity as user_rewards};
use crate::error::{AppError, AppResult};
use crate::models::{
    ClaimRewardResponse, PaginatedResponse, PaginationParams, UserRewardPageResponse,
    UserRewardQuery, UserRewardResponse,
};
use crate::utils::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct ClaimService {
    pool: DatabaseConnection,
    timeouts: TxnTimeouts,
    clock: Arc<dyn Clock>,
}

impl ClaimService {
    pub fn new(pool: DatabaseConnection, timeouts: TxnTimeouts) -> Self {
        Self {
            pool,
            timeouts,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 兑奖
    ///
    /// - 按 (user, claim_code, pending) 查找; 码错误 / 他人的码 / 已兑换统一返回 404
    /// - 已过期返回 400, 记录保持 pending
    /// - 以 `status = pending` 为条件更新, 并发兑换同一码只有一个成功
    pub async fn claim(&self, user_id: Uuid, claim_code: &str) -> AppResult<ClaimRewardResponse> {
        let claim_code = claim_code.trim();
        if claim_code.is_empty() {
            return Err(AppError::ValidationError("Claim code is required".into()));
        }

        let now = self.clock.now();
        let txn = begin_bounded(&self.pool, self.timeouts).await?;

        let (award, reward) = user_rewards::Entity::find()
            .filter(user_rewards::Column::UserId.eq(user_id))
            .filter(user_rewards::Column::ClaimCode.eq(claim_code))
            .filter(user_rewards::Column::Status.eq(AwardStatus::Pending))
            .find_also_related(rewards::Entity)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Invalid claim code or reward already claimed".into())
            })?;

        if award.is_expired_at(now) {
            return Err(AppError::Expired("Reward has expired".into()));
        }

        mark_claimed(&txn, award.id, now).await?;
        txn.commit().await?;
        log::info!("User {user_id} claimed reward record {}", award.id);

        let claimed = user_rewards::Model {
            status: AwardStatus::Claimed,
            claimed_at: Some(now),
            updated_at: now,
            ..award
        };
        Ok(ClaimRewardResponse {
            message: "Reward claimed successfully".into(),
            reward: UserRewardResponse::new(claimed, reward, now),
        })
    }

    /// 分页获取用户中奖记录（倒序）
    pub async fn list_user_rewards(
        &self,
        user_id: Uuid,
        query: &UserRewardQuery,
    ) -> AppResult<UserRewardPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);
        let now = self.clock.now();

        let base_query =
            user_rewards::Entity::find().filter(user_rewards::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await?;

        let rows = base_query
            .order_by_desc(user_rewards::Column::CreatedAt)
            .order_by_desc(user_rewards::Column::Id)
            .find_also_related(rewards::Entity)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(|(award, reward)| UserRewardResponse::new(award, reward, now))
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.get_page(),
            params.get_limit(),
            total,
        ))
    }
}

/// pending -> claimed 条件更新; 0 行表示已被并发请求兑换
pub(crate) async fn mark_claimed<C: ConnectionTrait>(
    db: &C,
    award_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let updated = user_rewards::Entity::update_many()
        .set(user_rewards::ActiveModel {
            status: Set(AwardStatus::Claimed),
            claimed_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        })
        .filter(user_rewards::Column::Id.eq(award_id))
        .filter(user_rewards::Column::Status.eq(AwardStatus::Pending))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        log::warn!("Claim race lost for reward record {award_id}");
        return Err(AppError::Conflict("Reward already claimed".into()));
    }
    Ok(())
}
