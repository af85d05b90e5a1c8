#![allow(dead_code)]

use std::sync::Arc;

use auth_server::application::{AuthController, LoginCommand, NonceProof};
use authgate_adapter_memory::{MemoryNonceStore, MemoryUserRepository};
use authgate_auth_core::{Claims, PemKeyProvider};
use authgate_bootstrap::Infrastructure;
use authgate_common::UserId;
use authgate_config::AppConfig;
use authgate_ports::{NewUserRecord, NonceStore, UserRepository};
use figment::{
    Figment,
    providers::{Format, Toml},
};
use secrecy::Secret;

pub const PRIVATE_PEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../testdata/keys/jwt_rs256.key"
));
pub const PUBLIC_PEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../testdata/keys/jwt_rs256.key.pub"
));

/// 测试用的密码包装
pub fn secret(value: &str) -> Secret<String> {
    Secret::new(value.to_string())
}

pub const ADDR: &str = "192.0.2.10";
pub const OTHER_ADDR: &str = "192.0.2.99";

pub fn test_config(extra: &str) -> AppConfig {
    config_with_storage("backend = \"memory\"", extra)
}

/// 带存储超时的测试配置
pub fn test_config_with_deadline(deadline_ms: u64) -> AppConfig {
    config_with_storage(
        &format!("backend = \"memory\"\ndeadline_ms = {deadline_ms}"),
        "",
    )
}

fn config_with_storage(storage: &str, extra: &str) -> AppConfig {
    let toml = format!(
        r#"
app_env = "test"

[storage]
{storage}

[password]
hash_cost = 4

[token]
private_key_path = "unused"
public_key_path = "unused"

{extra}
"#
    );
    AppConfig::from_figment(Figment::from(Toml::string(&toml))).unwrap()
}

pub struct Harness {
    pub infra: Arc<Infrastructure>,
    pub controller: Arc<AuthController>,
    pub nonce_store: Arc<MemoryNonceStore>,
    pub users: Arc<MemoryUserRepository>,
}

impl Harness {
    pub fn new() -> Self {
        let nonce_store = Arc::new(MemoryNonceStore::new());
        let users = Arc::new(MemoryUserRepository::new());
        let infra = build_infra(test_config(""), nonce_store.clone(), users.clone());
        let controller = Arc::new(AuthController::from_infrastructure(&infra));
        Self {
            infra,
            controller,
            nonce_store,
            users,
        }
    }

    pub async fn create_user(&self, username: &str, password: &str, admin: bool) -> UserId {
        create_user(&self.infra, self.users.as_ref(), username, password, admin, true).await
    }

    pub async fn proof(&self, addr: &str) -> NonceProof {
        let nonce = self.controller.issue_nonce(addr).await.unwrap();
        NonceProof::new(nonce, addr)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let proof = self.proof(ADDR).await;
        self.controller
            .login(
                LoginCommand {
                    username: username.to_string(),
                    password: secret(password),
                },
                &proof,
            )
            .await
            .unwrap()
    }

    pub async fn login_claims(&self, username: &str, password: &str) -> Claims {
        let token = self.login(username, password).await;
        self.controller.validate_bearer(&token).unwrap()
    }
}

pub fn build_infra(
    config: AppConfig,
    nonce_store: Arc<dyn NonceStore>,
    users: Arc<dyn UserRepository>,
) -> Arc<Infrastructure> {
    let keys = PemKeyProvider::from_pem(PRIVATE_PEM, PUBLIC_PEM);
    Arc::new(Infrastructure::with_stores(config, nonce_store, users, &keys).unwrap())
}

pub async fn create_user(
    infra: &Infrastructure,
    users: &dyn UserRepository,
    username: &str,
    password: &str,
    admin: bool,
    enabled: bool,
) -> UserId {
    let password_hash = infra
        .credential_verifier()
        .hash_password(password)
        .await
        .unwrap();
    users
        .insert(NewUserRecord {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash,
            admin,
            enabled,
        })
        .await
        .unwrap()
        .id
}
