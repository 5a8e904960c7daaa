//! Repository trait for the append-only audit log.
//!
//! Rows are never updated. The only deletion path is retention cleanup via
//! `delete_before`; everything else is insert or read. This table is the
//! system of record for security forensics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    storage::{AuditAction, AuditEvent, NewAuditEvent},
};

/// Repository for audit log data.
#[async_trait]
pub trait AuditLogRepository: Send + Sync + 'static {
    /// Append one entry. Returns the stored row with its assigned id and
    /// timestamp.
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, Error>;

    /// Entries for one email, most recent first.
    async fn find_by_email(&self, email: &str, limit: u32) -> Result<Vec<AuditEvent>, Error>;

    /// Most recent entries overall, optionally filtered by action.
    async fn find_recent(
        &self,
        limit: u32,
        action: Option<AuditAction>,
    ) -> Result<Vec<AuditEvent>, Error>;

    /// Count entries created after `since`, optionally filtered by action.
    async fn count_since(
        &self,
        since: DateTime<Utc>,
        action: Option<AuditAction>,
    ) -> Result<u64, Error>;

    /// Hard-delete entries created before the cutoff. Returns the number of
    /// rows deleted.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error>;
}
