//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that services use to
//! interact with storage. These traits provide a clean abstraction over the
//! underlying storage implementation.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus
//!   lifecycle methods

pub mod adapter;
pub mod audit;
pub mod lockout;
pub mod password;
pub mod token;
pub mod user;

pub use adapter::{
    AuditLogRepositoryAdapter, LockoutRepositoryAdapter, PasswordRepositoryAdapter,
    ResetTokenRepositoryAdapter, UserRepositoryAdapter,
};
pub use audit::AuditLogRepository;
pub use lockout::LockoutRepository;
pub use password::PasswordRepository;
pub use token::ResetTokenRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    /// The user repository implementation type
    type UserRepo: UserRepository;

    /// Get the user repository
    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for password repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    /// The password repository implementation type
    type PasswordRepo: PasswordRepository;

    /// Get the password repository
    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait for lockout repository access.
pub trait LockoutRepositoryProvider: Send + Sync + 'static {
    /// The lockout repository implementation type
    type LockoutRepo: LockoutRepository;

    /// Get the lockout repository
    fn lockout(&self) -> &Self::LockoutRepo;
}

/// Provider trait for audit log repository access.
pub trait AuditLogRepositoryProvider: Send + Sync + 'static {
    /// The audit log repository implementation type
    type AuditRepo: AuditLogRepository;

    /// Get the audit log repository
    fn audit(&self) -> &Self::AuditRepo;
}

/// Provider trait for reset token repository access.
pub trait ResetTokenRepositoryProvider: Send + Sync + 'static {
    /// The reset token repository implementation type
    type ResetTokenRepo: ResetTokenRepository;

    /// Get the reset token repository
    fn reset_token(&self) -> &Self::ResetTokenRepo;
}

/// Provider trait that storage implementations must implement to provide all
/// repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement this trait with `migrate()` and `health_check()`
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + PasswordRepositoryProvider
    + LockoutRepositoryProvider
    + AuditLogRepositoryProvider
    + ResetTokenRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
