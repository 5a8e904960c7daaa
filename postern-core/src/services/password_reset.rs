//! Password reset token lifecycle.
//!
//! A token moves through exactly one of three terminal states: consumed on a
//! successful reset, expired once its hour passes, or superseded when a newer
//! token is issued for the same email. All three read as "invalid" to
//! verification; they are distinguishable only through the stored
//! `used`/`expires_at` fields.
//!
//! The request path is enumeration-resistant: the caller receives the same
//! outcome whether or not the email maps to an account, and a failed email
//! send is logged rather than surfaced.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Error,
    crypto::generate_reset_token,
    error::{AuthError, CryptoError},
    repositories::{
        AuditLogRepository, PasswordRepository, ResetTokenRepository, UserRepository,
    },
    services::{AuditService, MailerService},
    storage::ResetToken,
    validation::{normalize_email, validate_email, validate_password},
};

/// Result of a token-validity probe (the "is this link still good" check).
#[derive(Debug, Clone)]
pub struct TokenProbe {
    pub valid: bool,
    pub email: Option<String>,
    /// Display form, e.g. `ab***@example.com`; never expose the full
    /// address to someone who only holds the token
    pub masked_email: Option<String>,
}

impl TokenProbe {
    fn invalid() -> Self {
        Self {
            valid: false,
            email: None,
            masked_email: None,
        }
    }
}

/// Service for password reset operations
pub struct PasswordResetService<U, P, T, A>
where
    U: UserRepository,
    P: PasswordRepository,
    T: ResetTokenRepository,
    A: AuditLogRepository,
{
    users: Arc<U>,
    passwords: Arc<P>,
    tokens: Arc<T>,
    audit: Arc<AuditService<A, U>>,
    mailer: Arc<dyn MailerService>,
}

impl<U, P, T, A> PasswordResetService<U, P, T, A>
where
    U: UserRepository,
    P: PasswordRepository,
    T: ResetTokenRepository,
    A: AuditLogRepository,
{
    pub fn new(
        users: Arc<U>,
        passwords: Arc<P>,
        tokens: Arc<T>,
        audit: Arc<AuditService<A, U>>,
        mailer: Arc<dyn MailerService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            audit,
            mailer,
        }
    }

    /// Issue a reset token for an existing account.
    ///
    /// Errors with [`AuthError::UserNotFound`] for an unknown email; callers
    /// at the HTTP boundary must not let that reach the client. Any prior
    /// valid tokens for the email are superseded before the new one is
    /// inserted, so at most one valid token exists per address.
    pub async fn create_reset_token(&self, email: &str) -> Result<String, Error> {
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_none() {
            return Err(AuthError::UserNotFound.into());
        }

        self.issue_token(&email).await
    }

    /// Check a token without consuming it. Returns the associated email for
    /// a valid token, `None` for anything else (missing, used, expired).
    pub async fn verify_reset_token(&self, token: &str) -> Result<Option<String>, Error> {
        let now = Utc::now();
        Ok(self
            .tokens
            .find(token)
            .await?
            .filter(|t| t.is_valid(now))
            .map(|t| t.email))
    }

    /// Mark a token as used.
    ///
    /// Call this only after the password update it guards has been durably
    /// applied: update-then-consume means a crash between the two leaves the
    /// token valid for retry instead of burning it on a failed update.
    pub async fn consume_reset_token(&self, token: &str) -> Result<(), Error> {
        self.tokens.mark_used(token).await
    }

    /// Orchestrated reset request.
    ///
    /// Validates syntax, then — only if the email maps to an account —
    /// issues a token, emails it, and audits the request. The outcome is
    /// identical for known and unknown addresses; only malformed input or a
    /// storage failure produce an error.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), Error> {
        validate_email(email)?;
        let email = normalize_email(email);

        if self.users.find_by_email(&email).await?.is_some() {
            let token = self.issue_token(&email).await?;

            if let Err(e) = self.mailer.send_password_reset_email(&email, &token).await {
                // Delivery failure must not change the response shape
                tracing::error!(error = %e, "Failed to send password reset email");
            }

            self.audit
                .log_password_reset_request(&email, ip_address, user_agent)
                .await;
        }

        Ok(())
    }

    /// Complete a password reset. Returns the email whose credential was
    /// updated.
    ///
    /// Any invalid token state maps to the one generic
    /// [`AuthError::InvalidResetToken`] error.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String, Error> {
        let now = Utc::now();
        let reset = match self.tokens.find(token).await? {
            Some(reset) if reset.is_valid(now) => reset,
            _ => return Err(AuthError::InvalidResetToken.into()),
        };

        validate_password(new_password)?;

        let user = self
            .users
            .find_by_email(&reset.email)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let hash = hash_password(new_password)?;
        self.passwords.set_password_hash(&user.id, &hash).await?;

        // Consume strictly after the credential write has been applied
        self.tokens.mark_used(&reset.token).await?;

        self.audit
            .log_password_reset_complete(Some(&user.id), &reset.email, ip_address, user_agent)
            .await;

        Ok(reset.email)
    }

    /// Token-validity probe for the reset form. An invalid token is a
    /// `valid: false` result, never an error.
    pub async fn check_reset_token(&self, token: &str) -> Result<TokenProbe, Error> {
        let now = Utc::now();
        match self.tokens.find(token).await? {
            Some(reset) if reset.is_valid(now) => Ok(TokenProbe {
                valid: true,
                masked_email: Some(mask_email(&reset.email)),
                email: Some(reset.email),
            }),
            _ => Ok(TokenProbe::invalid()),
        }
    }

    /// Delete used and expired tokens. Returns the number of rows removed.
    pub async fn cleanup_expired_reset_tokens(&self) -> Result<u64, Error> {
        let deleted = self.tokens.delete_spent(Utc::now()).await?;
        if deleted > 0 {
            tracing::info!(count = deleted, "Purged spent password reset tokens");
        }
        Ok(deleted)
    }

    /// Supersede prior tokens and insert a fresh one. The invalidation write
    /// completes before the insert so readers never observe two valid tokens.
    async fn issue_token(&self, email: &str) -> Result<String, Error> {
        let now = Utc::now();
        self.tokens.invalidate_for_email(email, now).await?;

        let token = ResetToken {
            token: generate_reset_token(),
            email: email.to_string(),
            expires_at: now + Duration::hours(1),
            used: false,
            created_at: now,
        };
        self.tokens.insert(&token).await?;

        Ok(token.token)
    }
}

/// Hash a password with bcrypt at the default cost (12).
fn hash_password(password: &str) -> Result<String, Error> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
}

/// Mask an email for display: `ab***@example.com`.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{visible}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorageError, ValidationError};
    use crate::id::generate_prefixed_id;
    use crate::storage::{AuditAction, AuditEvent, NewAuditEvent};
    use crate::{NewUser, User, UserId};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MockUserRepository {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, new_user: NewUser) -> Result<User, Error> {
            let user = User {
                id: new_user.id,
                email: new_user.email,
                name: new_user.name,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.id == id)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }
    }

    #[derive(Default)]
    struct MockPasswordRepository {
        hashes: Mutex<HashMap<UserId, String>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl PasswordRepository for MockPasswordRepository {
        async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Database("password store down".to_string()).into());
            }
            self.hashes
                .lock()
                .unwrap()
                .insert(user_id.clone(), hash.to_string());
            Ok(())
        }

        async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
            Ok(self.hashes.lock().unwrap().get(user_id).cloned())
        }
    }

    #[derive(Default)]
    struct MockResetTokenRepository {
        tokens: Mutex<HashMap<String, ResetToken>>,
    }

    #[async_trait]
    impl ResetTokenRepository for MockResetTokenRepository {
        async fn insert(&self, token: &ResetToken) -> Result<(), Error> {
            self.tokens
                .lock()
                .unwrap()
                .insert(token.token.clone(), token.clone());
            Ok(())
        }

        async fn find(&self, token: &str) -> Result<Option<ResetToken>, Error> {
            Ok(self.tokens.lock().unwrap().get(token).cloned())
        }

        async fn mark_used(&self, token: &str) -> Result<(), Error> {
            if let Some(t) = self.tokens.lock().unwrap().get_mut(token) {
                t.used = true;
            }
            Ok(())
        }

        async fn invalidate_for_email(
            &self,
            email: &str,
            now: DateTime<Utc>,
        ) -> Result<u64, Error> {
            let mut tokens = self.tokens.lock().unwrap();
            let mut count = 0;
            for t in tokens.values_mut() {
                if t.email == email && t.is_valid(now) {
                    t.used = true;
                    count += 1;
                }
            }
            Ok(count)
        }

        async fn delete_spent(&self, now: DateTime<Utc>) -> Result<u64, Error> {
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|_, t| t.is_valid(now));
            Ok((before - tokens.len()) as u64)
        }
    }

    struct MockAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditLogRepository for MockAuditRepository {
        async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent, Error> {
            let stored = AuditEvent {
                id: generate_prefixed_id("evt"),
                user_id: event.user_id,
                email: event.email,
                action: event.action,
                ip_address: event.ip_address,
                user_agent: event.user_agent,
                details: event.details,
                created_at: Utc::now(),
            };
            self.events.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn find_by_email(&self, _email: &str, _limit: u32) -> Result<Vec<AuditEvent>, Error> {
            Ok(Vec::new())
        }

        async fn find_recent(
            &self,
            _limit: u32,
            _action: Option<AuditAction>,
        ) -> Result<Vec<AuditEvent>, Error> {
            Ok(Vec::new())
        }

        async fn count_since(
            &self,
            _since: DateTime<Utc>,
            _action: Option<AuditAction>,
        ) -> Result<u64, Error> {
            Ok(0)
        }

        async fn delete_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, Error> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MockMailer {
        sent: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl MailerService for MockMailer {
        async fn send_password_reset_email(
            &self,
            to: &str,
            reset_token: &str,
        ) -> Result<(), Error> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("smtp unreachable".to_string()).into());
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), reset_token.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        service: PasswordResetService<
            MockUserRepository,
            MockPasswordRepository,
            MockResetTokenRepository,
            MockAuditRepository,
        >,
        users: Arc<MockUserRepository>,
        passwords: Arc<MockPasswordRepository>,
        tokens: Arc<MockResetTokenRepository>,
        audit_events: Arc<MockAuditRepository>,
        mailer: Arc<MockMailer>,
    }

    fn setup() -> Fixture {
        let users = Arc::new(MockUserRepository::default());
        let passwords = Arc::new(MockPasswordRepository::default());
        let tokens = Arc::new(MockResetTokenRepository::default());
        let audit_events = Arc::new(MockAuditRepository {
            events: Mutex::new(Vec::new()),
        });
        let mailer = Arc::new(MockMailer::default());
        let audit = Arc::new(AuditService::new(audit_events.clone(), users.clone()));

        Fixture {
            service: PasswordResetService::new(
                users.clone(),
                passwords.clone(),
                tokens.clone(),
                audit,
                mailer.clone(),
            ),
            users,
            passwords,
            tokens,
            audit_events,
            mailer,
        }
    }

    async fn create_user(fixture: &Fixture, email: &str) -> User {
        fixture
            .users
            .create(NewUser::new(email.to_string()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_token_unknown_email_errors() {
        let fixture = setup();

        let result = fixture.service.create_reset_token("nobody@example.com").await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::UserNotFound))
        ));
        assert!(fixture.tokens.tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_token_shape() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        let token = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_second_token_supersedes_first() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        let first = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();
        let second = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();

        assert!(fixture.service.verify_reset_token(&first).await.unwrap().is_none());
        assert_eq!(
            fixture.service.verify_reset_token(&second).await.unwrap(),
            Some("user@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_expired_token_fails_verification() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        let now = Utc::now();
        let stale = ResetToken {
            token: "a".repeat(64),
            email: "user@example.com".to_string(),
            expires_at: now - Duration::seconds(1),
            used: false,
            created_at: now - Duration::hours(2),
        };
        fixture.tokens.insert(&stale).await.unwrap();

        assert!(fixture
            .service
            .verify_reset_token(&stale.token)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_request_reset_is_enumeration_resistant() {
        let fixture = setup();
        create_user(&fixture, "known@example.com").await;

        // Identical outcomes for a known and an unknown address
        let known = fixture
            .service
            .request_password_reset("known@example.com", Some("10.0.0.1"), None)
            .await;
        let unknown = fixture
            .service
            .request_password_reset("unknown@example.com", Some("10.0.0.1"), None)
            .await;

        assert!(known.is_ok());
        assert!(unknown.is_ok());

        // Only the known address actually received mail
        let sent = fixture.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "known@example.com");
    }

    #[tokio::test]
    async fn test_request_reset_rejects_malformed_email() {
        let fixture = setup();

        let result = fixture
            .service
            .request_password_reset("not-an-email", None, None)
            .await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidEmail(_)))
        ));
    }

    #[tokio::test]
    async fn test_request_reset_survives_mailer_failure() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;
        fixture.mailer.fail.store(true, Ordering::SeqCst);

        // A broken mailer does not change the response
        let result = fixture
            .service
            .request_password_reset("user@example.com", None, None)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_end_to_end() {
        let fixture = setup();
        let user = create_user(&fixture, "user@example.com").await;

        let token = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();

        let email = fixture
            .service
            .reset_password(&token, "NewPassword1", None, None)
            .await
            .unwrap();
        assert_eq!(email, "user@example.com");

        // Hash is bcrypt and verifies against the new password
        let hash = fixture
            .passwords
            .get_password_hash(&user.id)
            .await
            .unwrap()
            .unwrap();
        assert!(bcrypt::verify("NewPassword1", &hash).unwrap());

        // Audit trail carries the completion event
        let events = fixture.audit_events.events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| e.action == AuditAction::PasswordResetComplete));
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        let token = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();

        fixture
            .service
            .reset_password(&token, "NewPassword1", None, None)
            .await
            .unwrap();

        // Well within the hour, but consumed
        let result = fixture
            .service
            .reset_password(&token, "AnotherPass2", None, None)
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidResetToken))
        ));
    }

    #[tokio::test]
    async fn test_weak_password_leaves_token_valid() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        let token = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();

        let result = fixture
            .service
            .reset_password(&token, "weak", None, None)
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        // The failed attempt did not burn the token
        let email = fixture
            .service
            .reset_password(&token, "NewPassword1", None, None)
            .await
            .unwrap();
        assert_eq!(email, "user@example.com");
    }

    #[tokio::test]
    async fn test_failed_credential_write_leaves_token_valid() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        let token = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();

        fixture.passwords.fail.store(true, Ordering::SeqCst);
        let result = fixture
            .service
            .reset_password(&token, "NewPassword1", None, None)
            .await;
        assert!(result.is_err());

        // Update-then-consume: the crash-equivalent path keeps the token
        // usable for retry
        fixture.passwords.fail.store(false, Ordering::SeqCst);
        assert!(fixture
            .service
            .reset_password(&token, "NewPassword1", None, None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_check_reset_token_masks_email() {
        let fixture = setup();
        create_user(&fixture, "alice@example.com").await;

        let token = fixture
            .service
            .create_reset_token("alice@example.com")
            .await
            .unwrap();

        let probe = fixture.service.check_reset_token(&token).await.unwrap();
        assert!(probe.valid);
        assert_eq!(probe.email.as_deref(), Some("alice@example.com"));
        assert_eq!(probe.masked_email.as_deref(), Some("al***@example.com"));

        // An invalid token is a result, not an error
        let probe = fixture
            .service
            .check_reset_token("not-a-real-token")
            .await
            .unwrap();
        assert!(!probe.valid);
        assert!(probe.email.is_none());
        assert!(probe.masked_email.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_removes_spent_tokens() {
        let fixture = setup();
        create_user(&fixture, "user@example.com").await;

        // One live, one used, one expired
        let live = fixture
            .service
            .create_reset_token("user@example.com")
            .await
            .unwrap();
        let now = Utc::now();
        fixture
            .tokens
            .insert(&ResetToken {
                token: "b".repeat(64),
                email: "other@example.com".to_string(),
                expires_at: now + Duration::hours(1),
                used: true,
                created_at: now,
            })
            .await
            .unwrap();
        fixture
            .tokens
            .insert(&ResetToken {
                token: "c".repeat(64),
                email: "other@example.com".to_string(),
                expires_at: now - Duration::hours(1),
                used: false,
                created_at: now - Duration::hours(2),
            })
            .await
            .unwrap();

        let deleted = fixture.service.cleanup_expired_reset_tokens().await.unwrap();
        assert_eq!(deleted, 2);
        assert!(fixture.service.verify_reset_token(&live).await.unwrap().is_some());
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "al***@example.com");
        assert_eq!(mask_email("ab@example.com"), "ab***@example.com");
        assert_eq!(mask_email("a@example.com"), "a***@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }
}
