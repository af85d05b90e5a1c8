//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use authgate_common::{HashedPassword, UserId};
use authgate_errors::{AppError, AppResult};
use authgate_ports::{Credential, NewUserRecord, UserPatch, UserRepository};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::map_sqlx_error;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    admin: bool,
    enabled: bool,
}

impl From<UserRow> for Credential {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            password_hash: HashedPassword::from_hash(row.password_hash),
            admin: row.admin,
            enabled: row.enabled,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Credential> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, admin, enabled
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find user", e))?;

        row.map(Credential::from)
            .ok_or_else(|| AppError::not_found(format!("user {}", username)))
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Credential> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, admin, enabled
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find user", e))?;

        row.map(Credential::from)
            .ok_or_else(|| AppError::not_found(format!("user {}", id)))
    }

    async fn insert(&self, user: NewUserRecord) -> AppResult<Credential> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, admin, enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password_hash, admin, enabled
            "#,
        )
        .bind(UserId::new().0)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.admin)
        .bind(user.enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert user", e))?;

        Ok(row.into())
    }

    async fn update_fields(&self, id: &UserId, patch: &UserPatch) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                admin = COALESCE($4, admin),
                enabled = COALESCE($5, enabled),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(patch.username.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.admin)
        .bind(patch.enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("user {}", id)));
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: &UserId, hash: &HashedPassword) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.0)
        .bind(hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("user {}", id)));
        }
        Ok(())
    }
}
