//! Account lockout service for brute force protection.
//!
//! Tracks failed login attempts per email and locks the account once the
//! configured threshold is reached. The counter row is keyed by lowercased
//! email; normalization happens here, at a single point, so storage never
//! sees case variants of the same address.
//!
//! The login-path methods (`record_failed_attempt`, `check_lockout_status`)
//! fail soft: a storage outage yields [`LockoutDecision::StorageUnavailable`]
//! rather than an error, and callers must treat that as the safe default
//! (proceed to normal credential checking). A broken lockout store must not
//! lock everyone out, and it must not grant anything beyond ordinary
//! authentication either.
//!
//! # Example
//!
//! ```rust,ignore
//! let status = service.check_lockout_status("user@example.com").await.status();
//! if status.is_locked {
//!     // Reject before touching credentials
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error,
    repositories::{AuditLogRepository, LockoutRepository, UserRepository},
    services::{AuditService, UnlockMethod},
    storage::{LockedAccount, LockoutConfig, LockoutRecord, LockoutStats, LockoutStatus},
    validation::normalize_email,
};

/// Outcome of a lockout evaluation.
///
/// `StorageUnavailable` is an explicit value, not an error: the caller is
/// required to treat it exactly like an unlocked status with a clean
/// counter.
#[derive(Debug, Clone)]
pub enum LockoutDecision {
    /// The store answered; here is the computed state
    Evaluated(LockoutStatus),
    /// The store could not be reached; treat as the safe default
    StorageUnavailable,
}

impl LockoutDecision {
    /// Collapse to a [`LockoutStatus`], substituting the safe default when
    /// the store was unavailable.
    pub fn status(self) -> LockoutStatus {
        match self {
            Self::Evaluated(status) => status,
            Self::StorageUnavailable => LockoutStatus::unlocked(),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Evaluated(status) if status.is_locked)
    }
}

/// Service for managing account lockout state.
///
/// Thread-safe; share it across tasks behind an `Arc`.
pub struct AccountLockoutService<L, A, U>
where
    L: LockoutRepository,
    A: AuditLogRepository,
    U: UserRepository,
{
    lockouts: Arc<L>,
    audit: Arc<AuditService<A, U>>,
    config: LockoutConfig,
}

impl<L, A, U> AccountLockoutService<L, A, U>
where
    L: LockoutRepository,
    A: AuditLogRepository,
    U: UserRepository,
{
    pub fn new(lockouts: Arc<L>, audit: Arc<AuditService<A, U>>, config: LockoutConfig) -> Self {
        Self {
            lockouts,
            audit,
            config,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Record a failed login attempt and return the updated lockout state.
    ///
    /// Increments the counter and, when the threshold is crossed on an
    /// account that was not already locked, persists the lock expiry and
    /// emits an `account_locked` audit event carrying the attempt count.
    pub async fn record_failed_attempt(
        &self,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> LockoutDecision {
        let email = normalize_email(email);
        let now = Utc::now();

        let record = match self.lockouts.record_attempt(&email, now).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to record login attempt; failing open");
                return LockoutDecision::StorageUnavailable;
            }
        };

        let already_locked = record.locked_until.is_some_and(|until| until > now);
        let mut status = compute_status(&record, &self.config, now);

        if record.failed_attempts >= self.config.max_attempts && !already_locked {
            let locked_until = now + self.config.lockout_duration;
            if let Err(e) = self
                .lockouts
                .set_locked_until(&email, Some(locked_until))
                .await
            {
                tracing::warn!(error = %e, "Failed to persist lock expiry; failing open");
                return LockoutDecision::StorageUnavailable;
            }

            status = LockoutStatus {
                is_locked: true,
                failed_attempts: record.failed_attempts,
                locked_until: Some(locked_until),
                remaining_minutes: Some(remaining_minutes(locked_until, now)),
            };

            self.audit
                .log_account_locked(&email, record.failed_attempts, ip_address, user_agent)
                .await;

            tracing::info!(
                email = %email,
                failed_attempts = record.failed_attempts,
                "Account locked after repeated failed login attempts"
            );
        }

        LockoutDecision::Evaluated(status)
    }

    /// Read-only lockout check. Returns the unlocked default when no row
    /// exists for the email.
    pub async fn check_lockout_status(&self, email: &str) -> LockoutDecision {
        let email = normalize_email(email);
        let now = Utc::now();

        match self.lockouts.find(&email).await {
            Ok(Some(record)) => {
                LockoutDecision::Evaluated(compute_status(&record, &self.config, now))
            }
            Ok(None) => LockoutDecision::Evaluated(LockoutStatus::unlocked()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to check lockout status; failing open");
                LockoutDecision::StorageUnavailable
            }
        }
    }

    /// Zero the counter after a successful authentication. Idempotent; a
    /// storage error is logged and swallowed.
    pub async fn reset_failed_attempts(&self, email: &str) {
        let email = normalize_email(email);
        if let Err(e) = self.lockouts.reset(&email).await {
            tracing::warn!(error = %e, "Failed to reset lockout counters");
        }
    }

    /// Administrative unlock. Returns `false` when there is nothing to
    /// unlock; otherwise zeroes the counters and emits `account_unlocked`
    /// with `method: "manual"`.
    pub async fn unlock_account(
        &self,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<bool, Error> {
        let email = normalize_email(email);

        if self.lockouts.find(&email).await?.is_none() {
            return Ok(false);
        }

        self.lockouts.reset(&email).await?;
        self.audit
            .log_account_unlocked(&email, UnlockMethod::Manual, ip_address, user_agent)
            .await;

        Ok(true)
    }

    /// All accounts that are locked or have reached the attempt threshold,
    /// most recent attempt first, annotated with remaining lock time.
    pub async fn locked_accounts(&self) -> Result<Vec<LockedAccount>, Error> {
        let now = Utc::now();
        let records = self
            .lockouts
            .find_locked(now, self.config.max_attempts)
            .await?;

        Ok(records
            .into_iter()
            .map(|record| LockedAccount {
                remaining_minutes: record
                    .locked_until
                    .map(|until| remaining_minutes(until, now)),
                email: record.email,
                failed_attempts: record.failed_attempts,
                locked_until: record.locked_until,
                last_attempt: record.last_attempt,
            })
            .collect())
    }

    /// Two-phase maintenance sweep, intended to be invoked on a schedule.
    ///
    /// Phase 1 resets naturally expired locks, emitting `account_unlocked`
    /// with `method: "auto"` for each account whose lock window has passed
    /// while its counter was still at threshold. Phase 2 deletes stale rows
    /// that carry no active flag. Returns the total rows affected.
    pub async fn cleanup_expired_lockouts(&self) -> Result<u64, Error> {
        let now = Utc::now();

        let expired = self
            .lockouts
            .find_expired_locks(now, self.config.max_attempts)
            .await?;
        for record in &expired {
            self.audit
                .log_account_unlocked(&record.email, UnlockMethod::Auto, None, None)
                .await;
        }
        self.lockouts.clear_expired_locks(now).await?;

        let cutoff = now - self.config.cleanup_after;
        let deleted = self.lockouts.delete_stale(cutoff).await?;

        let affected = deleted + expired.len() as u64;
        if affected > 0 {
            tracing::info!(
                auto_unlocked = expired.len(),
                deleted = deleted,
                "Cleaned up expired lockout records"
            );
        }

        Ok(affected)
    }

    /// Aggregate lockout counters for the admin dashboard.
    pub async fn lockout_stats(&self) -> Result<LockoutStats, Error> {
        let now = Utc::now();
        self.lockouts
            .stats(now, now - chrono::Duration::hours(24))
            .await
    }
}

/// Compute lockout state from a row. Pure function of the row, the config,
/// and the current instant.
fn compute_status(record: &LockoutRecord, config: &LockoutConfig, now: DateTime<Utc>) -> LockoutStatus {
    // An explicit, unexpired lock expiry is the authoritative boundary
    if let Some(until) = record.locked_until {
        if until > now {
            return LockoutStatus {
                is_locked: true,
                failed_attempts: record.failed_attempts,
                locked_until: Some(until),
                remaining_minutes: Some(remaining_minutes(until, now)),
            };
        }
    }

    // Counter at threshold without a live expiry (lock write racing or a
    // legacy row); treated as locked until reset or cleanup
    if record.failed_attempts >= config.max_attempts {
        return LockoutStatus {
            is_locked: true,
            failed_attempts: record.failed_attempts,
            locked_until: None,
            remaining_minutes: None,
        };
    }

    LockoutStatus {
        is_locked: false,
        failed_attempts: record.failed_attempts,
        locked_until: None,
        remaining_minutes: None,
    }
}

/// Whole minutes until `until`, ceiling-rounded and clamped to >= 0.
/// "14 minutes and 1 second left" reports as 15, never 0, while active.
fn remaining_minutes(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (until - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    (seconds as u64).div_ceil(60) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::id::generate_prefixed_id;
    use crate::storage::{AuditAction, AuditEvent, NewAuditEvent};
    use crate::{NewUser, User, UserId};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockLockoutRepository {
        rows: Mutex<HashMap<String, LockoutRecord>>,
        fail: AtomicBool,
    }

    impl MockLockoutRepository {
        fn new() -> Self {
            Self {
                rows: Mutex::new(HashMap::new()),
                fail: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), Error> {
            if self.fail.load(Ordering::SeqCst) {
                Err(StorageError::Database("lockout store down".to_string()).into())
            } else {
                Ok(())
            }
        }

        fn insert_row(&self, record: LockoutRecord) {
            self.rows
                .lock()
                .unwrap()
                .insert(record.email.clone(), record);
        }
    }

    #[async_trait]
    impl LockoutRepository for MockLockoutRepository {
        async fn record_attempt(
            &self,
            email: &str,
            now: DateTime<Utc>,
        ) -> Result<LockoutRecord, Error> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let record = rows
                .entry(email.to_string())
                .and_modify(|r| {
                    r.failed_attempts += 1;
                    r.last_attempt = now;
                })
                .or_insert(LockoutRecord {
                    email: email.to_string(),
                    failed_attempts: 1,
                    locked_until: None,
                    last_attempt: now,
                });
            Ok(record.clone())
        }

        async fn find(&self, email: &str) -> Result<Option<LockoutRecord>, Error> {
            self.check()?;
            Ok(self.rows.lock().unwrap().get(email).cloned())
        }

        async fn set_locked_until(
            &self,
            email: &str,
            locked_until: Option<DateTime<Utc>>,
        ) -> Result<(), Error> {
            self.check()?;
            if let Some(record) = self.rows.lock().unwrap().get_mut(email) {
                record.locked_until = locked_until;
            }
            Ok(())
        }

        async fn reset(&self, email: &str) -> Result<(), Error> {
            self.check()?;
            if let Some(record) = self.rows.lock().unwrap().get_mut(email) {
                record.failed_attempts = 0;
                record.locked_until = None;
            }
            Ok(())
        }

        async fn find_locked(
            &self,
            now: DateTime<Utc>,
            max_attempts: u32,
        ) -> Result<Vec<LockoutRecord>, Error> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            let mut locked: Vec<_> = rows
                .values()
                .filter(|r| {
                    r.locked_until.is_some_and(|u| u > now) || r.failed_attempts >= max_attempts
                })
                .cloned()
                .collect();
            locked.sort_by(|a, b| b.last_attempt.cmp(&a.last_attempt));
            Ok(locked)
        }

        async fn find_expired_locks(
            &self,
            now: DateTime<Utc>,
            max_attempts: u32,
        ) -> Result<Vec<LockoutRecord>, Error> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .values()
                .filter(|r| {
                    r.locked_until.is_some_and(|u| u < now) && r.failed_attempts >= max_attempts
                })
                .cloned()
                .collect())
        }

        async fn clear_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, Error> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let mut cleared = 0;
            for record in rows.values_mut() {
                if record.locked_until.is_some_and(|u| u < now) {
                    record.failed_attempts = 0;
                    record.locked_until = None;
                    cleared += 1;
                }
            }
            Ok(cleared)
        }

        async fn delete_stale(&self, before: DateTime<Utc>) -> Result<u64, Error> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let len_before = rows.len();
            rows.retain(|_, r| !(r.last_attempt < before && r.failed_attempts == 0));
            Ok((len_before - rows.len()) as u64)
        }

        async fn stats(
            &self,
            now: DateTime<Utc>,
            recent_since: DateTime<Utc>,
        ) -> Result<LockoutStats, Error> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(LockoutStats {
                total_locked: rows
                    .values()
                    .filter(|r| r.locked_until.is_some_and(|u| u > now))
                    .count() as u64,
                total_attempts: rows.values().map(|r| r.failed_attempts as u64).sum(),
                recent_lockouts: rows
                    .values()
                    .filter(|r| r.last_attempt > recent_since)
                    .count() as u64,
            })
        }
    }

    struct MockAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    impl MockAuditRepository {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn actions_for(&self, email: &str) -> Vec<AuditAction> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.email.as_deref() == Some(email))
                .map(|e| e.action)
                .collect()
        }
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
    struct MockUserRepository;

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, _new_user: NewUser) -> Result<User, Error> {
            unimplemented!()
        }

        async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, Error> {
            Ok(None)
        }

        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, Error> {
            Ok(None)
        }
    }

    type TestService =
        AccountLockoutService<MockLockoutRepository, MockAuditRepository, MockUserRepository>;

    fn setup(config: LockoutConfig) -> (TestService, Arc<MockLockoutRepository>, Arc<MockAuditRepository>) {
        let lockouts = Arc::new(MockLockoutRepository::new());
        let audit_repo = Arc::new(MockAuditRepository::new());
        let audit = Arc::new(AuditService::new(
            audit_repo.clone(),
            Arc::new(MockUserRepository),
        ));
        let service = AccountLockoutService::new(lockouts.clone(), audit, config);
        (service, lockouts, audit_repo)
    }

    #[tokio::test]
    async fn test_single_attempt_not_locked() {
        let (service, _, _) = setup(LockoutConfig::default());

        let status = service
            .record_failed_attempt("user@example.com", Some("127.0.0.1"), None)
            .await
            .status();

        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 1);
    }

    #[tokio::test]
    async fn test_lockout_after_max_attempts() {
        let (service, _, audit_repo) = setup(LockoutConfig::default());

        for _ in 0..4 {
            let status = service
                .record_failed_attempt("user@example.com", None, None)
                .await
                .status();
            assert!(!status.is_locked);
        }

        let status = service
            .record_failed_attempt("user@example.com", None, None)
            .await
            .status();
        assert!(status.is_locked);
        assert_eq!(status.failed_attempts, 5);
        assert!(status.locked_until.is_some());
        // remaining time is ceiling-rounded and bounded by the lock duration
        let remaining = status.remaining_minutes.unwrap();
        assert!(remaining >= 1 && remaining <= 15);

        assert_eq!(
            audit_repo.actions_for("user@example.com"),
            vec![AuditAction::AccountLocked]
        );
    }

    #[tokio::test]
    async fn test_check_status_reports_locked_during_window() {
        let (service, _, _) = setup(LockoutConfig::default());

        for _ in 0..5 {
            service
                .record_failed_attempt("user@example.com", None, None)
                .await;
        }

        // The check is independent of credential correctness; during the
        // window it reports locked no matter what the caller does next.
        let status = service.check_lockout_status("user@example.com").await;
        assert!(status.is_locked());
        let status = status.status();
        assert!(status.remaining_minutes.unwrap() >= 1);
        assert!(status.remaining_minutes.unwrap() <= 15);
    }

    #[tokio::test]
    async fn test_check_status_unknown_email() {
        let (service, _, _) = setup(LockoutConfig::default());

        let status = service.check_lockout_status("nobody@example.com").await.status();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_reset_clears_any_prior_state() {
        let (service, _, _) = setup(LockoutConfig::default());

        for _ in 0..5 {
            service
                .record_failed_attempt("user@example.com", None, None)
                .await;
        }
        assert!(service.check_lockout_status("user@example.com").await.is_locked());

        service.reset_failed_attempts("user@example.com").await;

        let status = service.check_lockout_status("user@example.com").await.status();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_fails_open() {
        let (service, lockouts, _) = setup(LockoutConfig::default());
        lockouts.set_failing(true);

        let decision = service
            .record_failed_attempt("user@example.com", None, None)
            .await;
        assert!(matches!(decision, LockoutDecision::StorageUnavailable));

        // The collapsed status is the safe default, not a lock
        let status = decision.status();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);

        let decision = service.check_lockout_status("user@example.com").await;
        assert!(matches!(decision, LockoutDecision::StorageUnavailable));
        assert!(!decision.is_locked());

        // reset swallows the error too
        service.reset_failed_attempts("user@example.com").await;
    }

    #[tokio::test]
    async fn test_email_is_normalized() {
        let (service, lockouts, _) = setup(LockoutConfig::default());

        service
            .record_failed_attempt("User@Example.COM", None, None)
            .await;
        service
            .record_failed_attempt("user@example.com", None, None)
            .await;

        // Both attempts land on the same row
        assert_eq!(lockouts.rows.lock().unwrap().len(), 1);
        let status = service.check_lockout_status("USER@EXAMPLE.COM").await.status();
        assert_eq!(status.failed_attempts, 2);
    }

    #[tokio::test]
    async fn test_unlock_account() {
        let (service, _, audit_repo) = setup(LockoutConfig::default());

        // Nothing to unlock yet
        assert!(!service.unlock_account("user@example.com", None, None).await.unwrap());

        for _ in 0..5 {
            service
                .record_failed_attempt("user@example.com", None, None)
                .await;
        }

        assert!(service
            .unlock_account("user@example.com", Some("10.0.0.1"), None)
            .await
            .unwrap());
        assert!(!service.check_lockout_status("user@example.com").await.is_locked());

        let actions = audit_repo.actions_for("user@example.com");
        assert_eq!(
            actions,
            vec![AuditAction::AccountLocked, AuditAction::AccountUnlocked]
        );

        let events = audit_repo.events.lock().unwrap();
        let unlocked = events
            .iter()
            .find(|e| e.action == AuditAction::AccountUnlocked)
            .unwrap();
        assert_eq!(unlocked.details.as_ref().unwrap()["method"], "manual");
    }

    #[tokio::test]
    async fn test_remaining_minutes_is_ceiling_rounded() {
        let (service, lockouts, _) = setup(LockoutConfig::default());
        let now = Utc::now();

        lockouts.insert_row(LockoutRecord {
            email: "user@example.com".to_string(),
            failed_attempts: 5,
            locked_until: Some(now + Duration::minutes(14) + Duration::seconds(1)),
            last_attempt: now,
        });

        let status = service.check_lockout_status("user@example.com").await.status();
        assert!(status.is_locked);
        assert_eq!(status.remaining_minutes, Some(15));
    }

    #[tokio::test]
    async fn test_threshold_without_expiry_counts_as_locked() {
        let (service, lockouts, _) = setup(LockoutConfig::default());
        let now = Utc::now();

        // Counter reached threshold but the expiry write never landed
        lockouts.insert_row(LockoutRecord {
            email: "user@example.com".to_string(),
            failed_attempts: 5,
            locked_until: None,
            last_attempt: now,
        });

        let status = service.check_lockout_status("user@example.com").await.status();
        assert!(status.is_locked);
        assert!(status.remaining_minutes.is_none());
    }

    #[tokio::test]
    async fn test_locked_accounts_listing() {
        let (service, lockouts, _) = setup(LockoutConfig::default());
        let now = Utc::now();

        lockouts.insert_row(LockoutRecord {
            email: "locked@example.com".to_string(),
            failed_attempts: 5,
            locked_until: Some(now + Duration::minutes(10)),
            last_attempt: now,
        });
        lockouts.insert_row(LockoutRecord {
            email: "clean@example.com".to_string(),
            failed_attempts: 2,
            locked_until: None,
            last_attempt: now - Duration::minutes(5),
        });

        let locked = service.locked_accounts().await.unwrap();
        assert_eq!(locked.len(), 1);
        assert_eq!(locked[0].email, "locked@example.com");
        assert_eq!(locked[0].remaining_minutes, Some(10));
    }

    #[tokio::test]
    async fn test_cleanup_resets_expired_lock_and_audits() {
        let (service, lockouts, audit_repo) = setup(LockoutConfig::default());
        let now = Utc::now();

        // Lock that expired one minute ago with the counter still at threshold
        lockouts.insert_row(LockoutRecord {
            email: "expired@example.com".to_string(),
            failed_attempts: 5,
            locked_until: Some(now - Duration::minutes(1)),
            last_attempt: now - Duration::minutes(16),
        });

        let affected = service.cleanup_expired_lockouts().await.unwrap();
        assert_eq!(affected, 1);

        let row = lockouts.find("expired@example.com").await.unwrap().unwrap();
        assert_eq!(row.failed_attempts, 0);
        assert!(row.locked_until.is_none());

        let events = audit_repo.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::AccountUnlocked);
        assert_eq!(events[0].details.as_ref().unwrap()["method"], "auto");
    }

    #[tokio::test]
    async fn test_cleanup_deletes_stale_clean_rows_only() {
        let (service, lockouts, _) = setup(LockoutConfig::default());
        let now = Utc::now();

        lockouts.insert_row(LockoutRecord {
            email: "stale@example.com".to_string(),
            failed_attempts: 0,
            locked_until: None,
            last_attempt: now - Duration::days(31),
        });
        // Old but still flagged; retention must not touch it
        lockouts.insert_row(LockoutRecord {
            email: "flagged@example.com".to_string(),
            failed_attempts: 3,
            locked_until: None,
            last_attempt: now - Duration::days(31),
        });

        let affected = service.cleanup_expired_lockouts().await.unwrap();
        assert_eq!(affected, 1);

        assert!(lockouts.find("stale@example.com").await.unwrap().is_none());
        assert!(lockouts.find("flagged@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lockout_stats() {
        let (service, lockouts, _) = setup(LockoutConfig::default());
        let now = Utc::now();

        lockouts.insert_row(LockoutRecord {
            email: "locked@example.com".to_string(),
            failed_attempts: 5,
            locked_until: Some(now + Duration::minutes(10)),
            last_attempt: now,
        });
        lockouts.insert_row(LockoutRecord {
            email: "warming@example.com".to_string(),
            failed_attempts: 2,
            locked_until: None,
            last_attempt: now - Duration::days(2),
        });

        let stats = service.lockout_stats().await.unwrap();
        assert_eq!(stats.total_locked, 1);
        assert_eq!(stats.total_attempts, 7);
        assert_eq!(stats.recent_lockouts, 1);

        // totals reconcile: explicitly locked rows are a subset of
        // threshold-flagged rows
        let flagged = service.locked_accounts().await.unwrap();
        assert!(stats.total_locked <= flagged.len() as u64);
    }

    #[tokio::test]
    async fn test_different_emails_tracked_separately() {
        let (service, _, _) = setup(LockoutConfig::default());

        for _ in 0..5 {
            service
                .record_failed_attempt("victim@example.com", None, None)
                .await;
        }

        assert!(service.check_lockout_status("victim@example.com").await.is_locked());
        assert!(!service.check_lockout_status("other@example.com").await.is_locked());
    }
}
