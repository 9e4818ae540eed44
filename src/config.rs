use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub lucky_draw: LuckyDrawConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// PostgreSQL `lock_timeout` (毫秒)，0 表示不设置
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// PostgreSQL `statement_timeout` (毫秒)，0 表示不设置
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 抽奖相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuckyDrawConfig {
    /// 每个用户每个自然日可抽奖次数
    #[serde(default = "default_daily_spin_limit")]
    pub daily_spin_limit: i32,
    /// 中奖后兑奖码有效天数
    #[serde(default = "default_claim_expiry_days")]
    pub claim_expiry_days: i64,
    /// 参考时区 (相对 UTC 的分钟偏移)，默认 +05:30
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// 抽奖历史返回的天数
    #[serde(default = "default_history_days")]
    pub history_days: i64,
}

impl Default for LuckyDrawConfig {
    fn default() -> Self {
        Self {
            daily_spin_limit: default_daily_spin_limit(),
            claim_expiry_days: default_claim_expiry_days(),
            utc_offset_minutes: default_utc_offset_minutes(),
            history_days: default_history_days(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_lock_timeout_ms() -> u64 {
    3_000
}

fn default_statement_timeout_ms() -> u64 {
    10_000
}

fn default_daily_spin_limit() -> i32 {
    3
}

fn default_claim_expiry_days() -> i64 {
    7
}

fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_history_days() -> i64 {
    30
}

impl LuckyDrawConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.daily_spin_limit < 1 {
            return Err(format!(
                "lucky_draw.daily_spin_limit 必须大于 0: {}",
                self.daily_spin_limit
            ));
        }
        if self.claim_expiry_days < 1 {
            return Err(format!(
                "lucky_draw.claim_expiry_days 必须大于 0: {}",
                self.claim_expiry_days
            ));
        }
        // FixedOffset 只接受 (-24h, 24h)
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(format!(
                "lucky_draw.utc_offset_minutes 超出范围: {}",
                self.utc_offset_minutes
            ));
        }
        if self.history_days < 1 {
            return Err(format!(
                "lucky_draw.history_days 必须大于 0: {}",
                self.history_days
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                        connect_timeout_secs: default_connect_timeout_secs(),
                        acquire_timeout_secs: default_acquire_timeout_secs(),
                        lock_timeout_ms: default_lock_timeout_ms(),
                        statement_timeout_ms: default_statement_timeout_ms(),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 86_400i64),
                    },
                    lucky_draw: LuckyDrawConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.lucky_draw.validate()?;

        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config =
            toml::from_str(config_str).map_err(|e| format!("解析配置文件失败: {e}"))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// 按变量名覆盖配置项, `get` 返回 None 表示未设置
    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Some(v) = get("DB_LOCK_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.database.lock_timeout_ms = n;
        }
        if let Some(v) = get("DB_STATEMENT_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.database.statement_timeout_ms = n;
        }
        if let Some(v) = get("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Some(v) = get("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }

        // Lucky draw
        if let Some(v) = get("LUCKY_DRAW_DAILY_SPIN_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.lucky_draw.daily_spin_limit = n;
        }
        if let Some(v) = get("LUCKY_DRAW_CLAIM_EXPIRY_DAYS")
            && let Ok(n) = v.parse()
        {
            self.lucky_draw.claim_expiry_days = n;
        }
        if let Some(v) = get("LUCKY_DRAW_UTC_OFFSET_MINUTES")
            && let Ok(n) = v.parse()
        {
            self.lucky_draw.utc_offset_minutes = n;
        }
        if let Some(v) = get("LUCKY_DRAW_HISTORY_DAYS")
            && let Ok(n) = v.parse()
        {
            self.lucky_draw.history_days = n;
        }
    }
}
