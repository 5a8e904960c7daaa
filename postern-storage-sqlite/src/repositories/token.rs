//! SQLite implementation of the password reset token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postern_core::{
    Error, error::StorageError, repositories::ResetTokenRepository, storage::ResetToken,
};
use sqlx::SqlitePool;

/// SQLite repository for password reset tokens.
pub struct SqliteResetTokenRepository {
    pool: SqlitePool,
}

impl SqliteResetTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteResetTokenRow {
    token: String,
    email: String,
    expires_at: i64,
    used: bool,
    created_at: i64,
}

impl From<SqliteResetTokenRow> for ResetToken {
    fn from(row: SqliteResetTokenRow) -> Self {
        ResetToken {
            token: row.token,
            email: row.email,
            expires_at: DateTime::from_timestamp(row.expires_at, 0).expect("Invalid timestamp"),
            used: row.used,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
        }
    }
}

#[async_trait]
impl ResetTokenRepository for SqliteResetTokenRepository {
    async fn insert(&self, token: &ResetToken) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, email, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(token.expires_at.timestamp())
        .bind(token.used)
        .bind(token.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert reset token");
            StorageError::Database("Failed to insert reset token".to_string())
        })?;

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<ResetToken>, Error> {
        let row = sqlx::query_as::<_, SqliteResetTokenRow>(
            r#"
            SELECT token, email, expires_at, used, created_at
            FROM password_reset_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch reset token");
            StorageError::Database("Failed to fetch reset token".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn mark_used(&self, token: &str) -> Result<(), Error> {
        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to mark reset token used");
                StorageError::Database("Failed to mark reset token used".to_string())
            })?;

        Ok(())
    }

    async fn invalidate_for_email(&self, email: &str, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used = 1
            WHERE email = ? AND used = 0 AND expires_at > ?
            "#,
        )
        .bind(email)
        .bind(now.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to invalidate reset tokens");
            StorageError::Database("Failed to invalidate reset tokens".to_string())
        })?;

        Ok(result.rows_affected())
    }

    async fn delete_spent(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result =
            sqlx::query("DELETE FROM password_reset_tokens WHERE used = 1 OR expires_at < ?")
                .bind(now.timestamp())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to delete spent reset tokens");
                    StorageError::Database("Failed to delete spent reset tokens".to_string())
                })?;

        Ok(result.rows_affected())
    }
}
