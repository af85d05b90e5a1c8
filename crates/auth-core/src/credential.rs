//! 密码哈希与校验（bcrypt）

use std::sync::Arc;

use authgate_common::HashedPassword;
use authgate_errors::{AppError, AppResult};
use tracing::warn;

/// bcrypt 允许的 cost 范围
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// 密码强度策略
pub trait PasswordPolicy: Send + Sync {
    fn acceptable(&self, plaintext: &str) -> bool;
}

/// 最小长度策略（按字符计数）
#[derive(Debug, Clone, Copy)]
pub struct MinLengthPolicy {
    min_length: usize,
}

impl MinLengthPolicy {
    pub const DEFAULT_MIN_LENGTH: usize = 10;

    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for MinLengthPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LENGTH)
    }
}

impl PasswordPolicy for MinLengthPolicy {
    fn acceptable(&self, plaintext: &str) -> bool {
        plaintext.chars().count() >= self.min_length
    }
}

/// 凭证校验器
#[derive(Clone)]
pub struct CredentialVerifier {
    cost: u32,
    policy: Arc<dyn PasswordPolicy>,
}

impl CredentialVerifier {
    pub fn new(cost: u32, policy: Arc<dyn PasswordPolicy>) -> AppResult<Self> {
        check_cost(cost)?;
        Ok(Self { cost, policy })
    }

    pub fn with_min_length(cost: u32, min_length: usize) -> AppResult<Self> {
        Self::new(cost, Arc::new(MinLengthPolicy::new(min_length)))
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// 使用构造时的 cost 哈希密码
    pub async fn hash_password(&self, plaintext: &str) -> AppResult<HashedPassword> {
        self.hash_password_with_cost(plaintext, self.cost).await
    }

    /// 使用指定 cost 哈希密码
    pub async fn hash_password_with_cost(
        &self,
        plaintext: &str,
        cost: u32,
    ) -> AppResult<HashedPassword> {
        check_cost(cost)?;

        let plaintext = plaintext.to_string();
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

        Ok(HashedPassword::from_hash(hash))
    }

    /// 验证密码，存储的哈希无法解析时返回 false
    pub async fn verify_password(&self, plaintext: &str, hash: &HashedPassword) -> bool {
        let plaintext = plaintext.to_string();
        let stored = hash.as_str().to_string();

        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// 检查密码是否满足强度策略
    pub fn acceptable_password(&self, plaintext: &str) -> bool {
        self.policy.acceptable(plaintext)
    }
}

fn check_cost(cost: u32) -> AppResult<()> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(AppError::validation(format!(
            "bcrypt cost must be within {}..={}, got {}",
            MIN_COST, MAX_COST, cost
        )));
    }
    Ok(())
}
