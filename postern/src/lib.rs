//! # Postern
//!
//! Postern is the security layer behind a credential-protected admin area:
//! account lockout against brute force, an append-only audit log of
//! security events, and a single-use, time-boxed password reset flow. It
//! owns none of your routing or session mechanics; you call it from your
//! authentication entry points and it keeps the state machines honest.
//!
//! The login-path contract:
//!
//! 1. Check [`Postern::check_lockout`] before touching credentials; reject
//!    when locked.
//! 2. On a failed credential check, call [`Postern::record_failed_login`].
//! 3. On success, call [`Postern::record_successful_login`].
//!
//! Lockout checks fail soft: when the store is unreachable the decision is
//! [`LockoutDecision::StorageUnavailable`], which collapses to "not locked"
//! so an outage can never lock every user out.
//!
//! ## Example
//!
//! ```rust,no_run
//! use postern::Postern;
//! use postern_storage_sqlite::SqliteRepositoryProvider;
//! use std::sync::Arc;
//!
//! # struct NullMailer;
//! # #[async_trait::async_trait]
//! # impl postern::MailerService for NullMailer {
//! #     async fn send_password_reset_email(&self, _: &str, _: &str) -> Result<(), postern::Error> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() {
//!     let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let postern = Postern::new(repositories, Arc::new(NullMailer));
//!     postern.migrate().await.unwrap();
//! }
//! ```

use std::sync::Arc;

use postern_core::{
    repositories::{
        AuditLogRepositoryAdapter, LockoutRepositoryAdapter, PasswordRepositoryAdapter,
        RepositoryProvider, ResetTokenRepositoryAdapter, UserRepositoryAdapter,
    },
    services::{AccountLockoutService, AuditService, PasswordResetService},
};

/// Re-export core types from postern_core
///
/// These types are commonly used when working with the Postern API.
pub use postern_core::{
    AuditAction, AuditEvent, AuditStats, Error, LockedAccount, LockoutConfig, LockoutStats,
    LockoutStatus, NewUser, User, UserId,
    services::{LockoutDecision, MailerService, TokenProbe, UnlockMethod, UserAuditLogs},
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding
/// feature is enabled.
#[cfg(feature = "sqlite")]
pub use postern_storage_sqlite::SqliteRepositoryProvider;

type Lockout<R> = AccountLockoutService<
    LockoutRepositoryAdapter<R>,
    AuditLogRepositoryAdapter<R>,
    UserRepositoryAdapter<R>,
>;
type Audit<R> = AuditService<AuditLogRepositoryAdapter<R>, UserRepositoryAdapter<R>>;
type PasswordReset<R> = PasswordResetService<
    UserRepositoryAdapter<R>,
    PasswordRepositoryAdapter<R>,
    ResetTokenRepositoryAdapter<R>,
    AuditLogRepositoryAdapter<R>,
>;

/// The central coordinator wiring the lockout, audit, and password reset
/// services over one repository provider.
pub struct Postern<R: RepositoryProvider> {
    repositories: Arc<R>,
    mailer: Arc<dyn MailerService>,
    lockout_service: Arc<Lockout<R>>,
    audit_service: Arc<Audit<R>>,
    password_reset_service: Arc<PasswordReset<R>>,
}

impl<R: RepositoryProvider> Postern<R> {
    /// Create a new Postern instance with default lockout thresholds.
    ///
    /// # Arguments
    ///
    /// * `repositories` - The repository provider implementation
    /// * `mailer` - Outbound email collaborator for reset tokens
    pub fn new(repositories: Arc<R>, mailer: Arc<dyn MailerService>) -> Self {
        Self::build(repositories, mailer, LockoutConfig::default())
    }

    /// Replace the lockout configuration.
    ///
    /// Thresholds are fixed at construction; this rebuilds the lockout
    /// service with the new config rather than mutating shared state.
    pub fn with_lockout_config(self, config: LockoutConfig) -> Self {
        Self::build(self.repositories, self.mailer, config)
    }

    fn build(repositories: Arc<R>, mailer: Arc<dyn MailerService>, config: LockoutConfig) -> Self {
        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let password_repo = Arc::new(PasswordRepositoryAdapter::new(repositories.clone()));
        let lockout_repo = Arc::new(LockoutRepositoryAdapter::new(repositories.clone()));
        let audit_repo = Arc::new(AuditLogRepositoryAdapter::new(repositories.clone()));
        let token_repo = Arc::new(ResetTokenRepositoryAdapter::new(repositories.clone()));

        let audit_service = Arc::new(AuditService::new(audit_repo, user_repo.clone()));
        let lockout_service = Arc::new(AccountLockoutService::new(
            lockout_repo,
            audit_service.clone(),
            config,
        ));
        let password_reset_service = Arc::new(PasswordResetService::new(
            user_repo,
            password_repo,
            token_repo,
            audit_service.clone(),
            mailer.clone(),
        ));

        Self {
            repositories,
            mailer,
            lockout_service,
            audit_service,
            password_reset_service,
        }
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// The account lockout service
    pub fn lockout(&self) -> &Lockout<R> {
        &self.lockout_service
    }

    /// The audit logging service
    pub fn audit(&self) -> &Audit<R> {
        &self.audit_service
    }

    /// The password reset service
    pub fn password_reset(&self) -> &PasswordReset<R> {
        &self.password_reset_service
    }

    /// Lockout check to run before any credential verification.
    pub async fn check_lockout(&self, email: &str) -> LockoutDecision {
        self.lockout_service.check_lockout_status(email).await
    }

    /// Record a failed credential check: bumps the lockout counter (possibly
    /// locking the account) and writes a `login_failed` audit entry.
    pub async fn record_failed_login(
        &self,
        email: &str,
        reason: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> LockoutDecision {
        let decision = self
            .lockout_service
            .record_failed_attempt(email, ip_address, user_agent)
            .await;

        self.audit_service
            .log_login_failed(email, reason, ip_address, user_agent)
            .await;

        decision
    }

    /// Record a successful authentication: clears the lockout counter and
    /// writes a `login_success` audit entry.
    pub async fn record_successful_login(
        &self,
        user_id: &UserId,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.lockout_service.reset_failed_attempts(email).await;
        self.audit_service
            .log_login_success(user_id, email, ip_address, user_agent)
            .await;
    }

    /// Request a password reset. The outcome is identical for known and
    /// unknown addresses; only malformed input surfaces an error.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), Error> {
        self.password_reset_service
            .request_password_reset(email, ip_address, user_agent)
            .await
    }

    /// Complete a password reset, then clear any lockout state for the
    /// account — proving control of the mailbox ends the lockout.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), Error> {
        let email = self
            .password_reset_service
            .reset_password(token, new_password, ip_address, user_agent)
            .await?;

        self.lockout_service.reset_failed_attempts(&email).await;

        Ok(())
    }

    /// Probe a reset token's validity without consuming it.
    pub async fn verify_reset_token(&self, token: &str) -> Result<TokenProbe, Error> {
        self.password_reset_service.check_reset_token(token).await
    }
}
