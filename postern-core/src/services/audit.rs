//! Security audit logging service.
//!
//! Every security-relevant action lands here as a typed, append-only event.
//! Writes are best-effort: a failed audit write must never abort the
//! operation it documents (a failed login still returns "invalid
//! credentials" to the user even if the audit insert fails), so `log` and
//! the typed wrappers never return an error. Failed writes fall back to the
//! process log stream via `tracing`.
//!
//! Read paths degrade the same way: on storage failure they return empty or
//! zeroed values so a broken audit store cannot take down a dashboard page.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;

use crate::{
    Error, User, UserId,
    repositories::{AuditLogRepository, UserRepository},
    storage::{AuditAction, AuditEvent, AuditStats, NewAuditEvent},
};

/// Default page size for per-user audit queries.
pub const DEFAULT_USER_LOG_LIMIT: u32 = 50;
/// Default page size for admin audit queries.
pub const DEFAULT_ADMIN_LOG_LIMIT: u32 = 100;
/// Default trailing window for dashboard statistics, in days.
pub const DEFAULT_STATS_WINDOW_DAYS: i64 = 30;
/// Default audit retention, in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 365;

/// How an account came to be unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockMethod {
    /// An administrator unlocked the account
    Manual,
    /// The lockout window expired during cleanup
    Auto,
}

impl UnlockMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

/// Audit entries for one identity, with the owning user attached when the
/// email resolves to an account.
#[derive(Debug, Clone)]
pub struct UserAuditLogs {
    pub user: Option<User>,
    pub events: Vec<AuditEvent>,
}

/// Service for writing and querying the security audit log.
pub struct AuditService<A: AuditLogRepository, U: UserRepository> {
    events: Arc<A>,
    users: Arc<U>,
}

impl<A: AuditLogRepository, U: UserRepository> AuditService<A, U> {
    /// Create a new AuditService with the given repositories
    pub fn new(events: Arc<A>, users: Arc<U>) -> Self {
        Self { events, users }
    }

    /// Append one audit entry. Never fails: on a storage error the entry is
    /// written to the process log instead and the call returns normally.
    pub async fn log(&self, event: NewAuditEvent) {
        if let Err(e) = self.events.append(event.clone()).await {
            tracing::error!(
                error = %e,
                action = %event.action,
                email = event.email.as_deref().unwrap_or("-"),
                user_id = event.user_id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
                "Failed to write audit log entry"
            );
        }
    }

    pub async fn log_login_success(
        &self,
        user_id: &UserId,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::LoginSuccess,
            Some(user_id),
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_login_failed(
        &self,
        email: &str,
        reason: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::LoginFailed,
            None,
            Some(email),
            ip_address,
            user_agent,
            json!({ "reason": reason, "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_logout(
        &self,
        user_id: &UserId,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::Logout,
            Some(user_id),
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_password_change(
        &self,
        user_id: &UserId,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::PasswordChange,
            Some(user_id),
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_password_reset_request(
        &self,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::PasswordResetRequest,
            None,
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_password_reset_complete(
        &self,
        user_id: Option<&UserId>,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::PasswordResetComplete,
            user_id,
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_session_revoked(
        &self,
        user_id: &UserId,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::SessionRevoked,
            Some(user_id),
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    pub async fn log_account_locked(
        &self,
        email: &str,
        failed_attempts: u32,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::AccountLocked,
            None,
            Some(email),
            ip_address,
            user_agent,
            json!({
                "failed_attempts": failed_attempts,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        ))
        .await;
    }

    pub async fn log_account_unlocked(
        &self,
        email: &str,
        method: UnlockMethod,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::AccountUnlocked,
            None,
            Some(email),
            ip_address,
            user_agent,
            json!({
                "method": method.as_str(),
                "timestamp": Utc::now().to_rfc3339(),
            }),
        ))
        .await;
    }

    pub async fn log_admin_unlock(
        &self,
        admin_user_id: &UserId,
        email: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        self.log(self.event(
            AuditAction::AdminUnlock,
            Some(admin_user_id),
            Some(email),
            ip_address,
            user_agent,
            json!({ "timestamp": Utc::now().to_rfc3339() }),
        ))
        .await;
    }

    /// Audit entries for one email, most recent first, with the resolved
    /// user attached where one exists. Storage errors degrade to an empty
    /// result.
    pub async fn user_audit_logs(&self, email: &str, limit: u32) -> UserAuditLogs {
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve user for audit query");
                None
            }
        };

        let events = match self.events.find_by_email(email, limit).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to query audit log");
                Vec::new()
            }
        };

        UserAuditLogs { user, events }
    }

    /// Most recent audit entries, optionally filtered by action. Storage
    /// errors degrade to an empty result.
    pub async fn all_audit_logs(
        &self,
        limit: u32,
        action: Option<AuditAction>,
    ) -> Vec<AuditEvent> {
        match self.events.find_recent(limit, action).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to query audit log");
                Vec::new()
            }
        }
    }

    /// Dashboard statistics over the trailing window.
    ///
    /// The five counts are windowed; `recent_events` is the ten most recent
    /// entries overall, regardless of window, so the "latest activity" panel
    /// stays populated even when the window is quiet.
    pub async fn audit_stats(&self, days: i64) -> AuditStats {
        let since = Utc::now() - Duration::days(days);

        let result: Result<AuditStats, Error> = async {
            let total_events = self.events.count_since(since, None).await?;
            let successes = self
                .events
                .count_since(since, Some(AuditAction::LoginSuccess))
                .await?;
            let failed_logins = self
                .events
                .count_since(since, Some(AuditAction::LoginFailed))
                .await?;
            let password_changes = self
                .events
                .count_since(since, Some(AuditAction::PasswordChange))
                .await?;
            let account_lockouts = self
                .events
                .count_since(since, Some(AuditAction::AccountLocked))
                .await?;
            let recent_events = self.events.find_recent(10, None).await?;

            Ok(AuditStats {
                total_events,
                login_attempts: successes + failed_logins,
                failed_logins,
                password_changes,
                account_lockouts,
                recent_events,
            })
        }
        .await;

        match result {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compute audit stats");
                AuditStats::default()
            }
        }
    }

    /// Delete entries older than the retention cutoff. Returns the number of
    /// rows deleted.
    pub async fn cleanup_old_logs(&self, days_to_keep: i64) -> Result<u64, Error> {
        let cutoff = Utc::now() - Duration::days(days_to_keep);
        let deleted = self.events.delete_before(cutoff).await?;
        if deleted > 0 {
            tracing::info!(count = deleted, "Purged old audit log entries");
        }
        Ok(deleted)
    }

    fn event(
        &self,
        action: AuditAction,
        user_id: Option<&UserId>,
        email: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        details: serde_json::Value,
    ) -> NewAuditEvent {
        NewAuditEvent {
            user_id: user_id.cloned(),
            email: email.map(|e| e.to_string()),
            action,
            ip_address: ip_address.map(|s| s.to_string()),
            user_agent: user_agent.map(|s| s.to_string()),
            details: Some(details),
        }
    }
}
