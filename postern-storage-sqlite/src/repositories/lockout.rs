//! SQLite implementation of the account lockout repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postern_core::{
    Error,
    error::StorageError,
    repositories::LockoutRepository,
    storage::{LockoutRecord, LockoutStats},
};
use sqlx::SqlitePool;

/// SQLite repository for account lockout data.
pub struct SqliteLockoutRepository {
    pool: SqlitePool,
}

impl SqliteLockoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteLockoutRow {
    email: String,
    failed_attempts: i64,
    locked_until: Option<i64>,
    last_attempt: i64,
}

impl From<SqliteLockoutRow> for LockoutRecord {
    fn from(row: SqliteLockoutRow) -> Self {
        LockoutRecord {
            email: row.email,
            failed_attempts: row.failed_attempts as u32,
            locked_until: row
                .locked_until
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            last_attempt: DateTime::from_timestamp(row.last_attempt, 0)
                .expect("Invalid timestamp"),
        }
    }
}

/// Internal struct for the stats query
#[derive(Debug, sqlx::FromRow)]
struct SqliteLockoutStats {
    total_locked: i64,
    total_attempts: i64,
    recent_lockouts: i64,
}

#[async_trait]
impl LockoutRepository for SqliteLockoutRepository {
    async fn record_attempt(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<LockoutRecord, Error> {
        let row = sqlx::query_as::<_, SqliteLockoutRow>(
            r#"
            INSERT INTO account_lockouts (email, failed_attempts, locked_until, last_attempt)
            VALUES (?, 1, NULL, ?)
            ON CONFLICT(email) DO UPDATE SET
                failed_attempts = failed_attempts + 1,
                last_attempt = excluded.last_attempt
            RETURNING email, failed_attempts, locked_until, last_attempt
            "#,
        )
        .bind(email)
        .bind(now.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record failed login attempt");
            StorageError::Database("Failed to record failed login attempt".to_string())
        })?;

        Ok(row.into())
    }

    async fn find(&self, email: &str) -> Result<Option<LockoutRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteLockoutRow>(
            r#"
            SELECT email, failed_attempts, locked_until, last_attempt
            FROM account_lockouts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch lockout record");
            StorageError::Database("Failed to fetch lockout record".to_string())
        })?;

        Ok(row.map(Into::into))
    }

    async fn set_locked_until(
        &self,
        email: &str,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE account_lockouts SET locked_until = ? WHERE email = ?")
            .bind(locked_until.map(|dt| dt.timestamp()))
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to set lock expiry");
                StorageError::Database("Failed to set lock expiry".to_string())
            })?;

        Ok(())
    }

    async fn reset(&self, email: &str) -> Result<(), Error> {
        sqlx::query(
            "UPDATE account_lockouts SET failed_attempts = 0, locked_until = NULL WHERE email = ?",
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to reset lockout record");
            StorageError::Database("Failed to reset lockout record".to_string())
        })?;

        Ok(())
    }

    async fn find_locked(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<LockoutRecord>, Error> {
        let rows = sqlx::query_as::<_, SqliteLockoutRow>(
            r#"
            SELECT email, failed_attempts, locked_until, last_attempt
            FROM account_lockouts
            WHERE (locked_until IS NOT NULL AND locked_until > ?)
               OR failed_attempts >= ?
            ORDER BY last_attempt DESC
            "#,
        )
        .bind(now.timestamp())
        .bind(max_attempts as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list locked accounts");
            StorageError::Database("Failed to list locked accounts".to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_expired_locks(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<LockoutRecord>, Error> {
        let rows = sqlx::query_as::<_, SqliteLockoutRow>(
            r#"
            SELECT email, failed_attempts, locked_until, last_attempt
            FROM account_lockouts
            WHERE locked_until IS NOT NULL
              AND locked_until < ?
              AND failed_attempts >= ?
            "#,
        )
        .bind(now.timestamp())
        .bind(max_attempts as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find expired locks");
            StorageError::Database("Failed to find expired locks".to_string())
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn clear_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE account_lockouts
            SET failed_attempts = 0, locked_until = NULL
            WHERE locked_until IS NOT NULL AND locked_until < ?
            "#,
        )
        .bind(now.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to clear expired locks");
            StorageError::Database("Failed to clear expired locks".to_string())
        })?;

        Ok(result.rows_affected())
    }

    async fn delete_stale(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        // Only rows with a clean counter; a flagged account is never
        // unlocked by retention cleanup
        let result = sqlx::query(
            "DELETE FROM account_lockouts WHERE last_attempt < ? AND failed_attempts = 0",
        )
        .bind(before.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to delete stale lockout records");
            StorageError::Database("Failed to delete stale lockout records".to_string())
        })?;

        Ok(result.rows_affected())
    }

    async fn stats(
        &self,
        now: DateTime<Utc>,
        recent_since: DateTime<Utc>,
    ) -> Result<LockoutStats, Error> {
        let row = sqlx::query_as::<_, SqliteLockoutStats>(
            r#"
            SELECT
                COUNT(CASE WHEN locked_until IS NOT NULL AND locked_until > ? THEN 1 END) AS total_locked,
                COALESCE(SUM(failed_attempts), 0) AS total_attempts,
                COUNT(CASE WHEN last_attempt > ? THEN 1 END) AS recent_lockouts
            FROM account_lockouts
            "#,
        )
        .bind(now.timestamp())
        .bind(recent_since.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to compute lockout stats");
            StorageError::Database("Failed to compute lockout stats".to_string())
        })?;

        Ok(LockoutStats {
            total_locked: row.total_locked as u64,
            total_attempts: row.total_attempts as u64,
            recent_lockouts: row.recent_lockouts as u64,
        })
    }
}
