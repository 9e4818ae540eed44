use sea_orm_migration::prelude::*;

/// Rewards (奖池配置)
#[derive(DeriveIden)]
enum Rewards {
    Table,
    Id,
    Name,
    Description,
    RewardType,
    Value,
    Probability,
    TotalAvailable,
    TotalClaimed,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// User Rewards (中奖记录 / 兑奖码)
#[derive(DeriveIden)]
enum UserRewards {
    Table,
    Id,
    UserId,
    RewardId,
    Status,
    ClaimCode,
    ExpiresAt,
    ClaimedAt,
    CreatedAt,
    UpdatedAt,
}

/// Spin Attempts (每用户每日抽奖次数)
#[derive(DeriveIden)]
enum SpinAttempts {
    Table,
    Id,
    UserId,
    AttemptDate,
    AttemptsCount,
    LastAttempt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// probability 为相对权重 (不要求归一化)
/// total_available 为 NULL 表示不限量；total_claimed 只增不减
/// reward_type = 'none' 表示"谢谢参与"，不生成 user_rewards 记录
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 奖池
        manager
            .create_table(
                Table::create()
                    .table(Rewards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rewards::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rewards::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Rewards::Description).text().null())
                    .col(ColumnDef::new(Rewards::RewardType).string_len(64).null())
                    .col(ColumnDef::new(Rewards::Value).double().null())
                    .col(ColumnDef::new(Rewards::Probability).double().not_null())
                    .col(ColumnDef::new(Rewards::TotalAvailable).integer().null())
                    .col(
                        ColumnDef::new(Rewards::TotalClaimed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rewards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Rewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Rewards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rewards_name_unique")
                    .table(Rewards::Table)
                    .col(Rewards::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 中奖记录；外键不级联删除，保证历史可追溯
        manager
            .create_table(
                Table::create()
                    .table(UserRewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRewards::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserRewards::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserRewards::RewardId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserRewards::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(UserRewards::ClaimCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRewards::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRewards::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(UserRewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserRewards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_rewards_reward")
                            .from(UserRewards::Table, UserRewards::RewardId)
                            .to(Rewards::Table, Rewards::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_rewards_claim_code_unique")
                    .table(UserRewards::Table)
                    .col(UserRewards::ClaimCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_rewards_user")
                    .table(UserRewards::Table)
                    .col(UserRewards::UserId)
                    .to_owned(),
            )
            .await?;

        // 每日抽奖次数
        manager
            .create_table(
                Table::create()
                    .table(SpinAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinAttempts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SpinAttempts::UserId).uuid().not_null())
                    .col(ColumnDef::new(SpinAttempts::AttemptDate).date().not_null())
                    .col(
                        ColumnDef::new(SpinAttempts::AttemptsCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(SpinAttempts::LastAttempt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // (user_id, attempt_date) 唯一：ON CONFLICT 依赖此索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_attempts_user_date_unique")
                    .table(SpinAttempts::Table)
                    .col(SpinAttempts::UserId)
                    .col(SpinAttempts::AttemptDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：中奖记录 -> 奖池 -> 次数
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(UserRewards::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Rewards::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SpinAttempts::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
