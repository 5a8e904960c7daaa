//! Repository trait for account lockout state.
//!
//! Lockout rows are keyed by lowercased email, one row per address, holding
//! a failed-attempt counter and an optional lock expiry. The repository does
//! not interpret thresholds; the service layer decides when a row means
//! "locked".
//!
//! # Security Considerations
//!
//! - Attempts must be recorded for all email addresses, even non-existent
//!   ones, to prevent user enumeration attacks.
//! - `delete_stale` must only remove rows whose counter is zero, so a
//!   currently flagged account is never unlocked by retention cleanup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    storage::{LockoutRecord, LockoutStats},
};

/// Repository for account lockout data.
#[async_trait]
pub trait LockoutRepository: Send + Sync + 'static {
    /// Record a failed login attempt for an email.
    ///
    /// Upserts the row: creates it with a counter of 1 on first failure,
    /// otherwise increments `failed_attempts`. `last_attempt` is set to
    /// `now` either way. Returns the updated row.
    async fn record_attempt(&self, email: &str, now: DateTime<Utc>)
    -> Result<LockoutRecord, Error>;

    /// Fetch the lockout row for an email, if any.
    async fn find(&self, email: &str) -> Result<Option<LockoutRecord>, Error>;

    /// Set or clear the explicit lock expiry for an email.
    ///
    /// A no-op if no row exists for the email.
    async fn set_locked_until(
        &self,
        email: &str,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), Error>;

    /// Reset the row to `failed_attempts = 0, locked_until = NULL`.
    ///
    /// Called after successful authentication or an unlock. A no-op if no
    /// row exists.
    async fn reset(&self, email: &str) -> Result<(), Error>;

    /// All rows that are explicitly locked (`locked_until > now`) or have
    /// reached the attempt threshold, ordered by `last_attempt` descending.
    async fn find_locked(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<LockoutRecord>, Error>;

    /// Rows whose explicit lock has expired while the counter is still at or
    /// above the threshold (naturally expired locks awaiting reset).
    async fn find_expired_locks(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<LockoutRecord>, Error>;

    /// Bulk-reset every row with `locked_until < now` to zeroed counters.
    ///
    /// Returns the number of rows reset.
    async fn clear_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, Error>;

    /// Hard-delete rows with `last_attempt` before the cutoff AND
    /// `failed_attempts = 0`.
    ///
    /// Returns the number of rows deleted.
    async fn delete_stale(&self, before: DateTime<Utc>) -> Result<u64, Error>;

    /// Aggregate counters for the admin dashboard.
    ///
    /// `recent_since` bounds the `recent_lockouts` count (attempts after
    /// that instant).
    async fn stats(
        &self,
        now: DateTime<Utc>,
        recent_since: DateTime<Utc>,
    ) -> Result<LockoutStats, Error>;
}
