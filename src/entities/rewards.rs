use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// reward_type 取该值时表示"谢谢参与"
pub const NO_PRIZE_TYPE: &str = "none";

/// 奖池配置实体
/// 概念说明:
/// - probability: 相对权重, 抽中概率 = probability / 可用奖品权重之和
/// - total_available: 总库存 (NULL 表示无限)
/// - total_claimed: 已发放数量, 仅由抽奖流程原子递增
/// - reward_type: 'none' 表示未中奖, 其它值 (或 NULL) 为实际奖品
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rewards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub reward_type: Option<String>,
    /// 奖品面值/积分
    pub value: Option<f64>,
    pub probability: f64,
    pub total_available: Option<i32>,
    pub total_claimed: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 奖品的两种形态：未中奖 / 实际奖品
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RewardKind {
    NoPrize,
    Real {
        value: Option<f64>,
        total_available: Option<i32>,
    },
}

impl Model {
    pub fn kind(&self) -> RewardKind {
        match self.reward_type.as_deref() {
            Some(NO_PRIZE_TYPE) => RewardKind::NoPrize,
            _ => RewardKind::Real {
                value: self.value,
                total_available: self.total_available,
            },
        }
    }

    /// 是否还有库存 (无限库存或已发放 < 总量)
    pub fn is_available(&self) -> bool {
        match self.total_available {
            None => true,
            Some(cap) => self.total_claimed < cap,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_rewards::Entity")]
    UserRewards,
}

impl Related<super::user_rewards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRewards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
