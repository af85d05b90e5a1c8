//! 认证控制器
//!
//! 每个操作都是 fail-fast 的流水线：第一步失败的类型化错误原样返回，不重试

use std::sync::Arc;
use std::time::Duration;

use authgate_auth_core::{
    Claims, CredentialVerifier, NonceService, TokenService, authorize, authorize_patch,
};
use authgate_bootstrap::Infrastructure;
use authgate_common::{UserId, with_deadline};
use authgate_errors::{AppError, AppResult};
use authgate_ports::{NewUserRecord, UserRepository};
use authgate_telemetry::names;
use metrics::counter;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use super::commands::{LoginCommand, NewUser, NonceProof, PasswordEdit, UserEdit};

/// 登录失败统一返回的信息，不区分密码错误与账号停用
pub const LOGIN_FAILED: &str = "invalid username or password";

/// 认证控制器
pub struct AuthController {
    nonces: Arc<NonceService>,
    credentials: Arc<CredentialVerifier>,
    tokens: Arc<TokenService>,
    users: Arc<dyn UserRepository>,
    storage_deadline: Duration,
}

impl AuthController {
    pub fn new(
        nonces: Arc<NonceService>,
        credentials: Arc<CredentialVerifier>,
        tokens: Arc<TokenService>,
        users: Arc<dyn UserRepository>,
        storage_deadline: Duration,
    ) -> Self {
        Self {
            nonces,
            credentials,
            tokens,
            users,
            storage_deadline,
        }
    }

    pub fn from_infrastructure(infra: &Infrastructure) -> Self {
        Self::new(
            infra.nonce_service(),
            infra.credential_verifier(),
            infra.token_service(),
            infra.user_repository(),
            infra.config().storage.deadline(),
        )
    }

    /// 签发 nonce
    pub async fn issue_nonce(&self, remote_address: &str) -> AppResult<String> {
        self.nonces.issue_challenge(remote_address).await
    }

    /// 登录，成功返回签名令牌
    pub async fn login(&self, cmd: LoginCommand, proof: &NonceProof) -> AppResult<String> {
        let result = self.login_inner(&cmd, proof).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        counter!(names::LOGIN, "outcome" => outcome).increment(1);
        result
    }

    async fn login_inner(&self, cmd: &LoginCommand, proof: &NonceProof) -> AppResult<String> {
        self.consume(proof).await?;

        let user = with_deadline(
            self.storage_deadline,
            "user_repository.find_by_username",
            self.users.find_by_username(&cmd.username),
        )
        .await?;

        if !self
            .credentials
            .verify_password(cmd.password.expose_secret(), &user.password_hash)
            .await
        {
            warn!(user_id = %user.id, remote_address = %proof.remote_address, "Password mismatch");
            return Err(AppError::login(LOGIN_FAILED));
        }

        // 与密码错误返回相同的信息
        if !user.enabled {
            warn!(user_id = %user.id, remote_address = %proof.remote_address, "Login to disabled account");
            return Err(AppError::login(LOGIN_FAILED));
        }

        let token = self
            .tokens
            .issue_token(&user.id, &user.username, &user.email, user.admin)?;
        info!(user_id = %user.id, admin = user.admin, "User logged in");
        Ok(token)
    }

    /// 新建账号
    pub async fn add_user(&self, user: NewUser, proof: &NonceProof) -> AppResult<UserId> {
        self.consume(proof).await?;

        require_non_empty("username", &user.username)?;
        require_non_empty("email", &user.email)?;
        if !self
            .credentials
            .acceptable_password(user.password.expose_secret())
        {
            return Err(AppError::validation("password does not meet the strength policy"));
        }

        let password_hash = self
            .credentials
            .hash_password(user.password.expose_secret())
            .await?;
        let record = NewUserRecord {
            username: user.username,
            email: user.email,
            password_hash,
            admin: user.admin,
            enabled: user.enabled,
        };

        let created = with_deadline(
            self.storage_deadline,
            "user_repository.insert",
            self.users.insert(record),
        )
        .await?;
        info!(user_id = %created.id, admin = created.admin, "User created");
        Ok(created.id)
    }

    /// 修改账号资料
    pub async fn edit_user(&self, edit: UserEdit, claims: &Claims, proof: &NonceProof) -> AppResult<()> {
        self.consume(proof).await?;

        let patch = edit.patch();
        authorize_patch(claims, &edit.target_id, &patch)?;
        if patch.is_empty() {
            return Err(AppError::validation("no fields to update"));
        }
        if let Some(username) = &patch.username {
            require_non_empty("username", username)?;
        }
        if let Some(email) = &patch.email {
            require_non_empty("email", email)?;
        }

        with_deadline(
            self.storage_deadline,
            "user_repository.update_fields",
            self.users.update_fields(&edit.target_id, &patch),
        )
        .await?;
        info!(caller = %claims.sub, target = %edit.target_id, "User updated");
        Ok(())
    }

    /// 修改密码，非管理员必须提供正确的旧密码
    pub async fn edit_user_password(
        &self,
        edit: PasswordEdit,
        claims: &Claims,
        proof: &NonceProof,
    ) -> AppResult<()> {
        self.consume(proof).await?;
        authorize(claims, &edit.target_id)?;

        if !claims.admin {
            let user = with_deadline(
                self.storage_deadline,
                "user_repository.find_by_id",
                self.users.find_by_id(&edit.target_id),
            )
            .await?;

            let old_password = edit
                .old_password
                .as_ref()
                .map(|p| p.expose_secret().as_str())
                .ok_or_else(|| AppError::login("old password is required"))?;
            if !self
                .credentials
                .verify_password(old_password, &user.password_hash)
                .await
            {
                warn!(user_id = %user.id, "Old password mismatch");
                return Err(AppError::login("old password does not match"));
            }
        }

        let new_password = edit.new_password.expose_secret();
        if !self.credentials.acceptable_password(new_password) {
            return Err(AppError::validation("password does not meet the strength policy"));
        }

        let hash = self.credentials.hash_password(new_password).await?;
        with_deadline(
            self.storage_deadline,
            "user_repository.update_password_hash",
            self.users.update_password_hash(&edit.target_id, &hash),
        )
        .await?;
        info!(caller = %claims.sub, target = %edit.target_id, "Password changed");
        Ok(())
    }

    /// 校验 bearer 令牌
    pub fn validate_bearer(&self, token: &str) -> AppResult<Claims> {
        self.tokens.validate_token(token)
    }

    /// 清理过期 nonce
    pub async fn sweep_expired_nonces(&self) -> AppResult<u64> {
        self.nonces.sweep_expired().await
    }

    pub fn public_key_pem(&self) -> &str {
        self.tokens.public_key_pem()
    }

    async fn consume(&self, proof: &NonceProof) -> AppResult<()> {
        self.nonces
            .consume_challenge(&proof.nonce, &proof.remote_address)
            .await?;
        debug!(remote_address = %proof.remote_address, "Nonce accepted");
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
