//! Adapters that wrap a [`RepositoryProvider`] and implement the individual
//! repository traits, so services stay generic over a single repository.

use crate::{
    Error, NewUser, User, UserId,
    repositories::{
        AuditLogRepository, LockoutRepository, PasswordRepository, RepositoryProvider,
        ResetTokenRepository, UserRepository,
    },
    storage::{AuditAction, AuditEvent, LockoutRecord, LockoutStats, NewAuditEvent, ResetToken},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_email(email).await
    }
}

pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider.password().set_password_hash(user_id, hash).await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }
}

pub struct LockoutRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LockoutRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LockoutRepository for LockoutRepositoryAdapter<R> {
    async fn record_attempt(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<LockoutRecord, Error> {
        self.provider.lockout().record_attempt(email, now).await
    }

    async fn find(&self, email: &str) -> Result<Option<LockoutRecord>, Error> {
        self.provider.lockout().find(email).await
    }

    async fn set_locked_until(
        &self,
        email: &str,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        self.provider
            .lockout()
            .set_locked_until(email, locked_until)
            .await
    }

    async fn reset(&self, email: &str) -> Result<(), Error> {
        self.provider.lockout().reset(email).await
    }

    async fn find_locked(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<LockoutRecord>, Error> {
        self.provider.lockout().find_locked(now, max_attempts).await
    }

    async fn find_expired_locks(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<LockoutRecord>, Error> {
        self.provider
            .lockout()
            .find_expired_locks(now, max_attempts)
            .await
    }

    async fn clear_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.lockout().clear_expired_locks(now).await
    }

    async fn delete_stale(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.lockout().delete_stale(before).await
    }

    async fn stats(
        &self,
        now: DateTime<Utc>,
        recent_since: DateTime<Utc>,
    ) -> Result<LockoutStats, Error> {
        self.provider.lockout().stats(now, recent_since).await
    }
}

pub struct AuditLogRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AuditLogRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AuditLogRepository for AuditLogRepositoryAdapter<R> {
    async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, Error> {
        self.provider.audit().append(event).await
    }

    async fn find_by_email(&self, email: &str, limit: u32) -> Result<Vec<AuditEvent>, Error> {
        self.provider.audit().find_by_email(email, limit).await
    }

    async fn find_recent(
        &self,
        limit: u32,
        action: Option<AuditAction>,
    ) -> Result<Vec<AuditEvent>, Error> {
        self.provider.audit().find_recent(limit, action).await
    }

    async fn count_since(
        &self,
        since: DateTime<Utc>,
        action: Option<AuditAction>,
    ) -> Result<u64, Error> {
        self.provider.audit().count_since(since, action).await
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.audit().delete_before(cutoff).await
    }
}

pub struct ResetTokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> ResetTokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> ResetTokenRepository for ResetTokenRepositoryAdapter<R> {
    async fn insert(&self, token: &ResetToken) -> Result<(), Error> {
        self.provider.reset_token().insert(token).await
    }

    async fn find(&self, token: &str) -> Result<Option<ResetToken>, Error> {
        self.provider.reset_token().find(token).await
    }

    async fn mark_used(&self, token: &str) -> Result<(), Error> {
        self.provider.reset_token().mark_used(token).await
    }

    async fn invalidate_for_email(&self, email: &str, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider
            .reset_token()
            .invalidate_for_email(email, now)
            .await
    }

    async fn delete_spent(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.reset_token().delete_spent(now).await
    }
}
