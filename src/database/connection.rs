use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnAcquireErr, ConnectOptions, ConnectionTrait, Database, DatabaseBackend,
    DatabaseConnection, DatabaseTransaction, DbErr, RuntimeErr, Statement, TransactionTrait,
};

/// PostgreSQL lock_not_available (lock_timeout 触发)
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLite SQLITE_BUSY
const SQLITE_BUSY: &str = "5";

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut opts = ConnectOptions::new(config.url.clone());
    opts.max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    let pool = Database::connect(opts).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 事务级超时 (仅 PostgreSQL 生效)
#[derive(Debug, Clone, Copy, Default)]
pub struct TxnTimeouts {
    pub lock_timeout_ms: u64,
    pub statement_timeout_ms: u64,
}

impl From<&DatabaseConfig> for TxnTimeouts {
    fn from(cfg: &DatabaseConfig) -> Self {
        Self {
            lock_timeout_ms: cfg.lock_timeout_ms,
            statement_timeout_ms: cfg.statement_timeout_ms,
        }
    }
}

/// 开启事务并设置 `SET LOCAL` 超时, 保证锁等待不会无限阻塞
pub async fn begin_bounded(
    pool: &DbPool,
    timeouts: TxnTimeouts,
) -> Result<DatabaseTransaction, DbErr> {
    let txn = pool.begin().await?;
    if pool.get_database_backend() == DatabaseBackend::Postgres {
        if timeouts.lock_timeout_ms > 0 {
            txn.execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("SET LOCAL lock_timeout = '{}ms'", timeouts.lock_timeout_ms),
            ))
            .await?;
        }
        if timeouts.statement_timeout_ms > 0 {
            txn.execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SET LOCAL statement_timeout = '{}ms'",
                    timeouts.statement_timeout_ms
                ),
            ))
            .await?;
        }
    }
    Ok(txn)
}

/// 是否为锁等待/取连接超时 (PostgreSQL 55P03 / SQLite busy / 连接池)
pub fn is_lock_timeout(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => true,
        DbErr::Query(RuntimeErr::SqlxError(sea_orm::SqlxError::Database(e)))
        | DbErr::Exec(RuntimeErr::SqlxError(sea_orm::SqlxError::Database(e))) => matches!(
            e.code().as_deref(),
            Some(PG_LOCK_NOT_AVAILABLE) | Some(SQLITE_BUSY)
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_lock_timeout() {
        assert!(is_lock_timeout(&DbErr::ConnectionAcquire(
            ConnAcquireErr::Timeout
        )));
        assert!(!is_lock_timeout(&DbErr::ConnectionAcquire(
            ConnAcquireErr::ConnectionClosed
        )));
        // 只看错误结构, 不按消息文本匹配
        assert!(!is_lock_timeout(&DbErr::Custom("request timed out".into())));
        assert!(!is_lock_timeout(&DbErr::Custom(
            "canceling statement due to lock timeout".into()
        )));
        assert!(!is_lock_timeout(&DbErr::RecordNotFound("reward".into())));
    }
}
