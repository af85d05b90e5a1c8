//! 内存 UserRepository

use std::collections::HashMap;

use async_trait::async_trait;
use authgate_common::{HashedPassword, UserId};
use authgate_errors::{AppError, AppResult};
use authgate_ports::{Credential, NewUserRecord, UserPatch, UserRepository};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, Credential>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

fn check_unique(
    users: &HashMap<UserId, Credential>,
    skip: Option<&UserId>,
    username: Option<&str>,
    email: Option<&str>,
) -> AppResult<()> {
    for user in users.values().filter(|u| Some(&u.id) != skip) {
        if username == Some(user.username.as_str()) {
            return Err(AppError::duplicate("username already exists"));
        }
        if email == Some(user.email.as_str()) {
            return Err(AppError::duplicate("email already exists"));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Credential> {
        self.users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("user {}", username)))
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Credential> {
        self.users
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("user {}", id)))
    }

    async fn insert(&self, user: NewUserRecord) -> AppResult<Credential> {
        let mut users = self.users.write();
        check_unique(&users, None, Some(&user.username), Some(&user.email))?;

        let credential = Credential {
            id: UserId::new(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            admin: user.admin,
            enabled: user.enabled,
        };
        users.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn update_fields(&self, id: &UserId, patch: &UserPatch) -> AppResult<()> {
        let mut users = self.users.write();
        if !users.contains_key(id) {
            return Err(AppError::not_found(format!("user {}", id)));
        }
        check_unique(
            &users,
            Some(id),
            patch.username.as_deref(),
            patch.email.as_deref(),
        )?;

        if let Some(user) = users.get_mut(id) {
            if let Some(username) = &patch.username {
                user.username = username.clone();
            }
            if let Some(email) = &patch.email {
                user.email = email.clone();
            }
            if let Some(admin) = patch.admin {
                user.admin = admin;
            }
            if let Some(enabled) = patch.enabled {
                user.enabled = enabled;
            }
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: &UserId, hash: &HashedPassword) -> AppResult<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("user {}", id)))?;
        user.password_hash = hash.clone();
        Ok(())
    }
}
