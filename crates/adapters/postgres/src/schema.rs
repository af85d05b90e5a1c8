//! 表结构初始化（幂等）

use authgate_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::info;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "auth_nonces",
        r#"
        CREATE TABLE IF NOT EXISTS auth_nonces (
            remote_address TEXT PRIMARY KEY,
            hash CHAR(128) NOT NULL UNIQUE,
            issued_at TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
    (
        "auth_nonces_issued_at_idx",
        "CREATE INDEX IF NOT EXISTS auth_nonces_issued_at_idx ON auth_nonces (issued_at)",
    ),
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            admin BOOLEAN NOT NULL DEFAULT FALSE,
            enabled BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_username_key UNIQUE (username),
            CONSTRAINT users_email_key UNIQUE (email)
        )
        "#,
    ),
];

/// 创建所需的表和索引
pub async fn ensure_schema(pool: &PgPool) -> AppResult<()> {
    for (name, sql) in STATEMENTS {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|e| AppError::repository(format!("Failed to create {}: {}", name, e)))?;
    }

    info!("Database schema ready");
    Ok(())
}
