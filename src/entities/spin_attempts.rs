use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 每日抽奖次数实体
/// 说明:
/// - (user_id, attempt_date) 唯一, 每用户每个参考日一条
/// - attempt_date 为参考时区下的自然日
/// - 记录永久保留, 作为抽奖历史
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "spin_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub attempt_date: NaiveDate,
    pub attempts_count: i32,
    pub last_attempt: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
