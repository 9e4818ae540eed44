use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    AwardStatus, reward_entity as reward, spin_attempt_entity as spin,
    user_reward_entity as user_reward,
};

/// 奖品展示信息（不暴露权重与库存）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RewardResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// "none" 表示谢谢参与
    pub reward_type: Option<String>,
    pub value: Option<f64>,
    pub is_active: bool,
}

impl From<reward::Model> for RewardResponse {
    fn from(m: reward::Model) -> Self {
        RewardResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            reward_type: m.reward_type,
            value: m.value,
            is_active: m.is_active,
        }
    }
}

/// 抽奖 (Spin) 响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinResponse {
    pub success: bool,
    /// 抽中的奖品 (可能是谢谢参与)
    pub reward: RewardResponse,
    pub message: String,
    /// 仅实际奖品返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// 当日已用次数 (含本次)
    pub attempts_used: i32,
    pub remaining_spins: i32,
}

/// 兑奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ClaimRewardRequest {
    pub claim_code: String,
}

/// 中奖记录对外状态; expired 由 expires_at 推导
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRewardStatus {
    Pending,
    Claimed,
    Expired,
}

impl UserRewardStatus {
    pub fn derive(status: AwardStatus, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        match status {
            AwardStatus::Claimed => UserRewardStatus::Claimed,
            AwardStatus::Pending if now > expires_at => UserRewardStatus::Expired,
            AwardStatus::Pending => UserRewardStatus::Pending,
        }
    }
}

/// 中奖记录响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserRewardResponse {
    pub id: Uuid,
    pub reward_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<RewardResponse>,
    pub status: UserRewardStatus,
    pub claim_code: String,
    pub expires_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRewardResponse {
    pub fn new(
        m: user_reward::Model,
        reward: Option<reward::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        UserRewardResponse {
            id: m.id,
            reward_id: m.reward_id,
            reward: reward.map(Into::into),
            status: UserRewardStatus::derive(m.status, m.expires_at, now),
            claim_code: m.claim_code,
            expires_at: m.expires_at,
            claimed_at: m.claimed_at,
            created_at: m.created_at,
        }
    }
}

/// 兑奖响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimRewardResponse {
    pub message: String,
    pub reward: UserRewardResponse,
}

/// 当日剩余次数
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RemainingSpinsResponse {
    pub remaining_spins: i32,
    pub total_daily_spins: i32,
    pub spins_used_today: i32,
    pub last_spin: Option<DateTime<Utc>>,
    pub can_spin_today: bool,
    /// 参考时区下的当天日期
    pub today: NaiveDate,
}

/// 抽奖历史 (按参考日)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinHistoryItem {
    pub attempt_date: NaiveDate,
    pub attempts_count: i32,
    pub last_attempt: DateTime<Utc>,
}

impl From<spin::Model> for SpinHistoryItem {
    fn from(m: spin::Model) -> Self {
        SpinHistoryItem {
            attempt_date: m.attempt_date,
            attempts_count: m.attempts_count,
            last_attempt: m.last_attempt,
        }
    }
}

/// 用户抽奖统计
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct UserRewardStats {
    pub total_spins: i64,
    pub total_wins: i64,
    pub pending_rewards: i64,
    pub claimed_rewards: i64,
    pub expired_rewards: i64,
}

/// 中奖记录查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UserRewardQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_derived_status() {
        let now = Utc::now();
        let later = now + Duration::days(1);
        let earlier = now - Duration::seconds(1);

        assert_eq!(
            UserRewardStatus::derive(AwardStatus::Pending, later, now),
            UserRewardStatus::Pending
        );
        assert_eq!(
            UserRewardStatus::derive(AwardStatus::Pending, earlier, now),
            UserRewardStatus::Expired
        );
        // 已兑换的不因过期而改变
        assert_eq!(
            UserRewardStatus::derive(AwardStatus::Claimed, earlier, now),
            UserRewardStatus::Claimed
        );
    }
}
