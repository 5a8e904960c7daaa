//! SQLite storage backend for the postern security toolkit
//!
//! Implements the postern-core repository traits over a `sqlx` SQLite pool.
//! Timestamps are stored as unix epoch seconds; audit `details` payloads are
//! stored as JSON text.

pub mod migrations;
pub mod repositories;

pub use repositories::{
    SqliteAuditLogRepository, SqliteLockoutRepository, SqlitePasswordRepository,
    SqliteRepositoryProvider, SqliteResetTokenRepository, SqliteUserRepository,
};
