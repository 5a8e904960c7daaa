//! Repository trait for password reset tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, storage::ResetToken};

/// Repository for password reset token data.
///
/// At most one valid (unused, unexpired) token may exist per email. The
/// service enforces this by calling `invalidate_for_email` before `insert`;
/// the invalidation write must be applied before the insert becomes visible
/// to readers. Backends with transactions should wrap the pair in one.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync + 'static {
    /// Insert a freshly issued token row.
    async fn insert(&self, token: &ResetToken) -> Result<(), Error>;

    /// Look up a token by its value.
    async fn find(&self, token: &str) -> Result<Option<ResetToken>, Error>;

    /// Mark a token as used. Exactly-once consumption is the caller's
    /// responsibility; marking an already-used token is a no-op.
    async fn mark_used(&self, token: &str) -> Result<(), Error>;

    /// Mark all currently valid tokens for an email as used (superseded).
    ///
    /// Returns the number of tokens invalidated.
    async fn invalidate_for_email(&self, email: &str, now: DateTime<Utc>) -> Result<u64, Error>;

    /// Delete tokens that are expired or already used. Returns the number of
    /// rows deleted.
    async fn delete_spent(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
