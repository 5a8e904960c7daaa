//! Core functionality for the postern security toolkit
//!
//! Postern guards the credential-based entry points of an application:
//! account lockout after repeated failed logins, an append-only audit log of
//! security events, and a single-use, time-boxed password reset token flow.
//!
//! Services in [`services`] hold the business logic and stay generic over
//! the repository traits in [`repositories`]; storage backends implement the
//! traits and expose themselves through a
//! [`RepositoryProvider`](repositories::RepositoryProvider).

pub mod crypto;
pub mod error;
pub mod id;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod user;
pub mod validation;

pub use error::Error;
pub use repositories::RepositoryProvider;
pub use storage::{
    AuditAction, AuditEvent, AuditStats, LockedAccount, LockoutConfig, LockoutStats,
    LockoutStatus, ResetToken,
};
pub use user::{NewUser, User, UserId};
