//! UserRepository trait 定义

use async_trait::async_trait;
use authgate_common::{HashedPassword, UserId};
use authgate_errors::AppResult;

/// 存储中的账号凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: HashedPassword,
    pub admin: bool,
    pub enabled: bool,
}

/// 待插入的账号
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: HashedPassword,
    pub admin: bool,
    pub enabled: bool,
}

/// 稀疏更新，None 字段保持不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub admin: Option<bool>,
    pub enabled: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.admin.is_none()
            && self.enabled.is_none()
    }

    /// 是否修改特权字段
    pub fn touches_privileges(&self) -> bool {
        self.admin.is_some() || self.enabled.is_some()
    }
}

/// 用户仓储
///
/// 行不存在返回 NotFound，唯一约束冲突返回 Duplicate，其他失败返回 Repository
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Credential>;

    async fn find_by_id(&self, id: &UserId) -> AppResult<Credential>;

    async fn insert(&self, user: NewUserRecord) -> AppResult<Credential>;

    async fn update_fields(&self, id: &UserId, patch: &UserPatch) -> AppResult<()>;

    async fn update_password_hash(&self, id: &UserId, hash: &HashedPassword) -> AppResult<()>;
}
