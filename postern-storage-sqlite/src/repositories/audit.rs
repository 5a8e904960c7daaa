//! SQLite implementation of the audit log repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postern_core::{
    Error, UserId,
    error::StorageError,
    id::generate_prefixed_id,
    repositories::AuditLogRepository,
    storage::{AuditAction, AuditEvent, NewAuditEvent},
};
use sqlx::SqlitePool;

/// SQLite repository for the append-only audit log.
pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAuditRow {
    id: String,
    user_id: Option<String>,
    email: Option<String>,
    action: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: Option<String>,
    created_at: i64,
}

impl TryFrom<SqliteAuditRow> for AuditEvent {
    type Error = Error;

    fn try_from(row: SqliteAuditRow) -> Result<Self, Self::Error> {
        let action: AuditAction = row
            .action
            .parse()
            .map_err(|e: String| Error::Storage(StorageError::Database(e)))?;

        Ok(AuditEvent {
            id: row.id,
            user_id: row.user_id.map(UserId::from),
            email: row.email,
            action,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            details: row.details.and_then(|d| serde_json::from_str(&d).ok()),
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
        })
    }
}

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, Error> {
        let row = sqlx::query_as::<_, SqliteAuditRow>(
            r#"
            INSERT INTO audit_log (id, user_id, email, action, ip_address, user_agent, details, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, email, action, ip_address, user_agent, details, created_at
            "#,
        )
        .bind(generate_prefixed_id("evt"))
        .bind(event.user_id.map(|id| id.into_inner()))
        .bind(&event.email)
        .bind(event.action.as_str())
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.details.map(|d| d.to_string()))
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to append audit log entry");
            StorageError::Database("Failed to append audit log entry".to_string())
        })?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str, limit: u32) -> Result<Vec<AuditEvent>, Error> {
        let rows = sqlx::query_as::<_, SqliteAuditRow>(
            r#"
            SELECT id, user_id, email, action, ip_address, user_agent, details, created_at
            FROM audit_log
            WHERE email = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(email)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to query audit log");
            StorageError::Database("Failed to query audit log".to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_recent(
        &self,
        limit: u32,
        action: Option<AuditAction>,
    ) -> Result<Vec<AuditEvent>, Error> {
        let rows = match action {
            Some(action) => {
                sqlx::query_as::<_, SqliteAuditRow>(
                    r#"
                    SELECT id, user_id, email, action, ip_address, user_agent, details, created_at
                    FROM audit_log
                    WHERE action = ?
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(action.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, SqliteAuditRow>(
                    r#"
                    SELECT id, user_id, email, action, ip_address, user_agent, details, created_at
                    FROM audit_log
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to query audit log");
            StorageError::Database("Failed to query audit log".to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_since(
        &self,
        since: DateTime<Utc>,
        action: Option<AuditAction>,
    ) -> Result<u64, Error> {
        let count: i64 = match action {
            Some(action) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM audit_log WHERE created_at >= ? AND action = ?",
                )
                .bind(since.timestamp())
                .bind(action.as_str())
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE created_at >= ?")
                    .bind(since.timestamp())
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count audit log entries");
            StorageError::Database("Failed to count audit log entries".to_string())
        })?;

        Ok(count as u64)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM audit_log WHERE created_at < ?")
            .bind(cutoff.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete old audit log entries");
                StorageError::Database("Failed to delete old audit log entries".to_string())
            })?;

        Ok(result.rows_affected())
    }
}
