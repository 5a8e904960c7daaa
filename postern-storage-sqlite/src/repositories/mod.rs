//! Repository implementations for SQLite storage

pub mod audit;
pub mod lockout;
pub mod password;
pub mod token;
pub mod user;

pub use audit::SqliteAuditLogRepository;
pub use lockout::SqliteLockoutRepository;
pub use password::SqlitePasswordRepository;
pub use token::SqliteResetTokenRepository;
pub use user::SqliteUserRepository;

use async_trait::async_trait;
use postern_core::{
    Error,
    error::StorageError,
    repositories::{
        AuditLogRepositoryProvider, LockoutRepositoryProvider, PasswordRepositoryProvider,
        RepositoryProvider, ResetTokenRepositoryProvider, UserRepositoryProvider,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository provider implementation for SQLite
///
/// This struct implements all the individual repository provider traits
/// as well as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    password: Arc<SqlitePasswordRepository>,
    lockout: Arc<SqliteLockoutRepository>,
    audit: Arc<SqliteAuditLogRepository>,
    reset_token: Arc<SqliteResetTokenRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));
        let lockout = Arc::new(SqliteLockoutRepository::new(pool.clone()));
        let audit = Arc::new(SqliteAuditLogRepository::new(pool.clone()));
        let reset_token = Arc::new(SqliteResetTokenRepository::new(pool.clone()));

        Self {
            pool,
            user,
            password,
            lockout,
            audit,
            reset_token,
        }
    }
}

// Implement individual provider traits

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

impl LockoutRepositoryProvider for SqliteRepositoryProvider {
    type LockoutRepo = SqliteLockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo {
        &self.lockout
    }
}

impl AuditLogRepositoryProvider for SqliteRepositoryProvider {
    type AuditRepo = SqliteAuditLogRepository;

    fn audit(&self) -> &Self::AuditRepo {
        &self.audit
    }
}

impl ResetTokenRepositoryProvider for SqliteRepositoryProvider {
    type ResetTokenRepo = SqliteResetTokenRepository;

    fn reset_token(&self) -> &Self::ResetTokenRepo {
        &self.reset_token
    }
}

// Implement the unified RepositoryProvider trait

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{
            CreateAccountLockoutsTable, CreateAuditLogTable, CreateIndexes,
            CreatePasswordResetTokensTable, CreateUsersTable, SqliteMigrationManager,
        };
        use postern_migration::{Migration, MigrationManager};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        let migrations: Vec<Box<dyn Migration<_>>> = vec![
            Box::new(CreateUsersTable),
            Box::new(CreateAccountLockoutsTable),
            Box::new(CreateAuditLogTable),
            Box::new(CreatePasswordResetTokensTable),
            Box::new(CreateIndexes),
        ];
        manager.up(&migrations).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
