//! 基础设施资源管理
//!
//! 按配置装配存储后端、密钥与认证核心服务

use std::sync::Arc;

use authgate_adapter_memory::{MemoryNonceStore, MemoryUserRepository};
use authgate_adapter_postgres::{
    PgNonceStore, PgUserRepository, PostgresConfig, check_connection, create_pool, ensure_schema,
};
use authgate_auth_core::{CredentialVerifier, NonceService, NonceSettings, PemKeyProvider, TokenService};
use authgate_common::with_deadline;
use authgate_config::{AppConfig, StorageBackend};
use authgate_errors::{AppError, AppResult};
use authgate_ports::{KeyProvider, NewUserRecord, NonceStore, UserRepository};
use authgate_telemetry::HealthStatus;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use crate::retry::{RetryConfig, with_retry};

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: Option<PgPool>,
    user_repository: Arc<dyn UserRepository>,
    nonce_service: Arc<NonceService>,
    credential_verifier: Arc<CredentialVerifier>,
    token_service: Arc<TokenService>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let keys = PemKeyProvider::from_files(
            &config.token.private_key_path,
            &config.token.public_key_path,
        )?;

        let (postgres_pool, nonce_store, user_repository) = match config.storage.backend {
            StorageBackend::Postgres => {
                let database = config.database.as_ref().ok_or_else(|| {
                    AppError::internal("database section missing for postgres backend")
                })?;
                let pg_config = PostgresConfig::new(database.url.expose_secret())
                    .with_max_connections(database.max_connections)
                    .with_connect_timeout(config.storage.deadline());

                let pool = with_retry(&RetryConfig::default(), "PostgreSQL connection", || {
                    let cfg = pg_config.clone();
                    async move { create_pool(&cfg).await }
                })
                .await?;
                ensure_schema(&pool).await?;
                info!(
                    max_connections = database.max_connections,
                    "PostgreSQL connection pool created"
                );

                let nonce_store: Arc<dyn NonceStore> = Arc::new(PgNonceStore::new(pool.clone()));
                let user_repository: Arc<dyn UserRepository> =
                    Arc::new(PgUserRepository::new(pool.clone()));
                (Some(pool), nonce_store, user_repository)
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage, state is lost on restart");
                let nonce_store: Arc<dyn NonceStore> = Arc::new(MemoryNonceStore::new());
                let user_repository: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
                (None, nonce_store, user_repository)
            }
        };

        let mut infra = Self::with_stores(config, nonce_store, user_repository, &keys)?;
        infra.postgres_pool = postgres_pool;
        infra.seed_admin().await?;
        Ok(infra)
    }

    /// 使用给定的存储和密钥装配服务
    pub fn with_stores(
        config: AppConfig,
        nonce_store: Arc<dyn NonceStore>,
        user_repository: Arc<dyn UserRepository>,
        keys: &dyn KeyProvider,
    ) -> AppResult<Self> {
        let nonce_service = NonceService::new(
            nonce_store,
            NonceSettings {
                ttl: config.nonce.ttl(),
                deadline: config.storage.deadline(),
                bypass: config.nonce.bypass,
                production: config.is_production(),
            },
        )?;
        let credential_verifier =
            CredentialVerifier::with_min_length(config.password.hash_cost, config.password.min_length)?;
        let token_service = TokenService::new(keys, config.token.ttl())?;

        info!(
            hash_cost = config.password.hash_cost,
            token_ttl_secs = config.token.ttl_secs,
            nonce_ttl_secs = config.nonce.ttl_secs,
            "Auth services ready"
        );

        Ok(Self {
            config,
            postgres_pool: None,
            user_repository,
            nonce_service: Arc::new(nonce_service),
            credential_verifier: Arc::new(credential_verifier),
            token_service: Arc::new(token_service),
        })
    }

    /// 创建初始管理员（用户名已存在时跳过）
    pub async fn seed_admin(&self) -> AppResult<()> {
        let Some(admin) = &self.config.bootstrap_admin else {
            return Ok(());
        };
        let deadline = self.config.storage.deadline();

        match with_deadline(
            deadline,
            "user_repository.find_by_username",
            self.user_repository.find_by_username(&admin.username),
        )
        .await
        {
            Ok(_) => {
                info!(username = %admin.username, "Initial admin already present");
                return Ok(());
            }
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let password_hash = self
            .credential_verifier
            .hash_password(admin.password.expose_secret())
            .await?;
        let record = NewUserRecord {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            admin: true,
            enabled: true,
        };

        match with_deadline(deadline, "user_repository.insert", self.user_repository.insert(record)).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "Initial admin created");
                Ok(())
            }
            // 多实例同时启动时另一个实例可能已插入
            Err(AppError::Duplicate(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// 检查存储后端
    pub async fn health(&self) -> HealthStatus {
        let mut status = HealthStatus::new();
        match &self.postgres_pool {
            Some(pool) => {
                let result = with_deadline(
                    self.config.storage.deadline(),
                    "postgres.check_connection",
                    check_connection(pool),
                )
                .await;
                status.add_check("postgres", result.is_ok(), result.err().map(|e| e.to_string()));
            }
            None => status.add_check("memory", true, None),
        }
        status
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> Option<&PgPool> {
        self.postgres_pool.as_ref()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn nonce_service(&self) -> Arc<NonceService> {
        self.nonce_service.clone()
    }

    pub fn credential_verifier(&self) -> Arc<CredentialVerifier> {
        self.credential_verifier.clone()
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }
}
