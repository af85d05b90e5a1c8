//! PostgreSQL NonceStore

use async_trait::async_trait;
use authgate_errors::AppResult;
use authgate_ports::{ChallengeRecord, NonceStore};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::map_sqlx_error;

pub struct PgNonceStore {
    pool: PgPool,
}

impl PgNonceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NonceStore for PgNonceStore {
    async fn issue(&self, record: ChallengeRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_nonces (remote_address, hash, issued_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (remote_address)
            DO UPDATE SET hash = EXCLUDED.hash, issued_at = EXCLUDED.issued_at
            "#,
        )
        .bind(&record.remote_address)
        .bind(&record.hash)
        .bind(record.issued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to store nonce", e))?;
        Ok(())
    }

    async fn consume_if_valid(
        &self,
        hash: &str,
        remote_address: &str,
        not_older_than: DateTime<Utc>,
    ) -> AppResult<bool> {
        // 单条 DELETE ... RETURNING，并发消费只有一个能拿到行
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM auth_nonces
            WHERE hash = $1 AND remote_address = $2 AND issued_at > $3
            RETURNING remote_address
            "#,
        )
        .bind(hash)
        .bind(remote_address)
        .bind(not_older_than)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to consume nonce", e))?;

        Ok(row.is_some())
    }

    async fn sweep(&self, older_than: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM auth_nonces WHERE issued_at < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to sweep nonces", e))?;
        Ok(result.rows_affected())
    }
}
