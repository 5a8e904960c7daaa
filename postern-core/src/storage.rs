//! Record types shared between repositories and services.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Configuration for account lockout behavior.
///
/// Constructed once and injected into the service; thresholds are not
/// mutable at runtime.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failed attempts before the account is locked
    pub max_attempts: u32,
    /// How long a lockout lasts once triggered
    pub lockout_duration: Duration,
    /// Retention window for stale, unflagged lockout rows
    pub cleanup_after: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(15),
            cleanup_after: Duration::days(30),
        }
    }
}

/// One lockout row, keyed by lowercased email.
#[derive(Debug, Clone, PartialEq)]
pub struct LockoutRecord {
    pub email: String,
    pub failed_attempts: u32,
    /// When set and in the future, the authoritative lock boundary
    pub locked_until: Option<DateTime<Utc>>,
    pub last_attempt: DateTime<Utc>,
}

/// Computed lockout state for an email address.
#[derive(Debug, Clone, Serialize)]
pub struct LockoutStatus {
    pub is_locked: bool,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    /// Whole minutes until the lock expires, ceiling-rounded; `None` when
    /// not locked or when no explicit expiry exists
    pub remaining_minutes: Option<i64>,
}

impl LockoutStatus {
    /// The safe default: unknown state is treated as unlocked with a clean
    /// counter, so a storage outage cannot become a denial of service.
    pub fn unlocked() -> Self {
        Self {
            is_locked: false,
            failed_attempts: 0,
            locked_until: None,
            remaining_minutes: None,
        }
    }
}

/// Admin-facing view of a currently locked (or threshold-flagged) account.
#[derive(Debug, Clone, Serialize)]
pub struct LockedAccount {
    pub email: String,
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_attempt: DateTime<Utc>,
    pub remaining_minutes: Option<i64>,
}

/// Aggregate lockout counters for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LockoutStats {
    /// Rows with `locked_until` in the future
    pub total_locked: u64,
    /// Sum of `failed_attempts` across all rows
    pub total_attempts: u64,
    /// Rows with a failed attempt in the last 24 hours
    pub recent_lockouts: u64,
}

/// Closed enumeration of security-relevant actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LoginSuccess,
    LoginFailed,
    Logout,
    PasswordChange,
    PasswordResetRequest,
    PasswordResetComplete,
    SessionRevoked,
    AccountLocked,
    AccountUnlocked,
    AdminUnlock,
    ProfileUpdated,
    SettingsChanged,
}

impl AuditAction {
    /// Wire/storage form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::PasswordChange => "password_change",
            Self::PasswordResetRequest => "password_reset_request",
            Self::PasswordResetComplete => "password_reset_complete",
            Self::SessionRevoked => "session_revoked",
            Self::AccountLocked => "account_locked",
            Self::AccountUnlocked => "account_unlocked",
            Self::AdminUnlock => "admin_unlock",
            Self::ProfileUpdated => "profile_updated",
            Self::SettingsChanged => "settings_changed",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login_success" => Ok(Self::LoginSuccess),
            "login_failed" => Ok(Self::LoginFailed),
            "logout" => Ok(Self::Logout),
            "password_change" => Ok(Self::PasswordChange),
            "password_reset_request" => Ok(Self::PasswordResetRequest),
            "password_reset_complete" => Ok(Self::PasswordResetComplete),
            "session_revoked" => Ok(Self::SessionRevoked),
            "account_locked" => Ok(Self::AccountLocked),
            "account_unlocked" => Ok(Self::AccountUnlocked),
            "admin_unlock" => Ok(Self::AdminUnlock),
            "profile_updated" => Ok(Self::ProfileUpdated),
            "settings_changed" => Ok(Self::SettingsChanged),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit log entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub id: String,
    /// Weak reference to the acting/affected user; no cascading ownership
    pub user_id: Option<UserId>,
    /// Denormalized for events with no resolved user (e.g. unknown email)
    pub email: Option<String>,
    pub action: AuditAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Data for appending one audit log entry.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub action: AuditAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl NewAuditEvent {
    pub fn new(action: AuditAction) -> Self {
        Self {
            user_id: None,
            email: None,
            action,
            ip_address: None,
            user_agent: None,
            details: None,
        }
    }
}

/// Dashboard statistics over the audit log.
///
/// The counts are restricted to the trailing window; `recent_events` is the
/// latest activity overall, deliberately unwindowed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditStats {
    pub total_events: u64,
    pub login_attempts: u64,
    pub failed_logins: u64,
    pub password_changes: u64,
    pub account_lockouts: u64,
    pub recent_events: Vec<AuditEvent>,
}

/// A password reset token row, keyed by the token string.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetToken {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    /// A token is valid for verification iff it is unused and unexpired.
    /// Consumed, expired, and superseded tokens are indistinguishable here.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}
