//! authgate-config - 配置加载库

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 为 None 时生产环境输出 JSON，其他环境输出文本
    #[serde(default)]
    pub json: Option<bool>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: None,
        }
    }
}

/// Nonce 配置
#[derive(Debug, Clone, Deserialize)]
pub struct NonceConfig {
    #[serde(default = "default_nonce_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// 跳过 nonce 消费（仅在启用 insecure-nonce-bypass 特性编译时生效）
    #[serde(default)]
    pub bypass: bool,
}

fn default_nonce_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl NonceConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_nonce_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            bypass: false,
        }
    }
}

/// Token 配置
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_ttl_secs")]
    pub ttl_secs: u64,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
}

fn default_token_ttl_secs() -> u64 {
    4 * 60 * 60
}

impl TokenConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// 密码配置
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_hash_cost() -> u32 {
    12
}

fn default_min_length() -> usize {
    10
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            hash_cost: default_hash_cost(),
            min_length: default_min_length(),
        }
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
}

fn default_deadline_ms() -> u64 {
    5000
}

fn default_backend() -> StorageBackend {
    StorageBackend::Postgres
}

impl StorageConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            backend: default_backend(),
        }
    }
}

/// 初始管理员账号
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub nonce: NonceConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub bootstrap_admin: Option<AdminSeedConfig>,
}

fn default_app_name() -> String {
    "authgate".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 优先级：`{dir}/default.toml` < `{dir}/{APP_ENV}.toml` < `AUTHGATE_*` 环境变量
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("AUTHGATE_").split("__"));

        Self::from_figment(figment)
    }

    /// 从任意 Figment 提取并校验配置
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::Invalid(
                "database section is required for the postgres storage backend".to_string(),
            ));
        }

        if !(4..=31).contains(&self.password.hash_cost) {
            return Err(ConfigError::Invalid(format!(
                "password.hash_cost must be within 4..=31, got {}",
                self.password.hash_cost
            )));
        }

        if self.nonce.ttl_secs == 0 || self.token.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "nonce.ttl_secs and token.ttl_secs must be positive".to_string(),
            ));
        }

        if self.nonce.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "nonce.sweep_interval_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    /// 是否输出 JSON 日志
    pub fn json_logs(&self) -> bool {
        self.telemetry.json.unwrap_or_else(|| self.is_production())
    }
}
