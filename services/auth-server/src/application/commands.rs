//! 控制器命令

use authgate_common::UserId;
use authgate_ports::UserPatch;
use secrecy::Secret;

/// 调用方提交的 nonce 以及请求来源地址
#[derive(Debug, Clone)]
pub struct NonceProof {
    pub nonce: String,
    pub remote_address: String,
}

impl NonceProof {
    pub fn new(nonce: impl Into<String>, remote_address: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            remote_address: remote_address.into(),
        }
    }
}

/// 登录命令
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub username: String,
    pub password: Secret<String>,
}

/// 新建账号
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    pub admin: bool,
    pub enabled: bool,
}

/// 稀疏修改账号，None 字段保持不变
#[derive(Debug, Clone)]
pub struct UserEdit {
    pub target_id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
    pub admin: Option<bool>,
    pub enabled: Option<bool>,
}

impl UserEdit {
    pub fn patch(&self) -> UserPatch {
        UserPatch {
            username: self.username.clone(),
            email: self.email.clone(),
            admin: self.admin,
            enabled: self.enabled,
        }
    }
}

/// 修改密码，管理员可省略旧密码
#[derive(Debug, Clone)]
pub struct PasswordEdit {
    pub target_id: UserId,
    pub old_password: Option<Secret<String>>,
    pub new_password: Secret<String>,
}
