use postern::{AuditEvent, AuditStats, LockedAccount, LockoutStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockAccountRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditLogQuery {
    pub limit: Option<u32>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserAuditLogQuery {
    pub email: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditStatsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResetTokenResponse {
    pub success: bool,
    pub valid: bool,
    /// Masked for display; the token holder never learns the full address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnlockAccountResponse {
    pub success: bool,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LockedAccountsResponse {
    pub accounts: Vec<LockedAccount>,
    pub stats: LockoutStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLogResponse {
    pub events: Vec<AuditEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditStatsResponse {
    pub stats: AuditStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAuditLogResponse {
    pub user: Option<postern::User>,
    pub events: Vec<AuditEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub lockouts_affected: u64,
    pub audit_entries_deleted: u64,
    pub reset_tokens_deleted: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
