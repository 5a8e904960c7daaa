use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use postern::{AuditAction, Postern};
use postern_core::RepositoryProvider;
use postern_core::services::audit::{
    DEFAULT_ADMIN_LOG_LIMIT, DEFAULT_RETENTION_DAYS, DEFAULT_STATS_WINDOW_DAYS,
    DEFAULT_USER_LOG_LIMIT,
};

use crate::{
    error::{ApiError, Result},
    types::*,
};

/// The uniform response for every well-formed reset request, existing
/// account or not.
const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, you will receive a password reset link.";

/// Shared state for all route handlers.
pub struct AuthState<R: RepositoryProvider> {
    pub postern: Arc<Postern<R>>,
}

impl<R: RepositoryProvider> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            postern: self.postern.clone(),
        }
    }
}

/// Build the router for the postern HTTP surface.
///
/// The `/auth` routes are public. The `/admin` routes expose full lockout
/// and audit detail and must be protected by the embedding application's
/// own authentication middleware.
pub fn create_router<R>(postern: Arc<Postern<R>>) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AuthState { postern };

    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route(
            "/auth/reset-password",
            get(verify_reset_token_handler).post(reset_password_handler),
        )
        .route("/admin/lockouts", get(locked_accounts_handler))
        .route("/admin/lockouts/unlock", post(unlock_account_handler))
        .route("/admin/audit", get(audit_log_handler))
        .route("/admin/audit/stats", get(audit_stats_handler))
        .route("/admin/audit/user", get(user_audit_log_handler))
        .route("/admin/maintenance/cleanup", post(cleanup_handler))
        .with_state(state)
}

async fn health_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .postern
        .health_check()
        .await
        .map_err(|_| ApiError::InternalError)?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn forgot_password_handler<R>(
    State(state): State<AuthState<R>>,
    connection_info: ConnectionInfo,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .postern
        .request_password_reset(
            &payload.email,
            connection_info.ip.as_deref(),
            connection_info.user_agent.as_deref(),
        )
        .await?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: RESET_REQUESTED_MESSAGE.to_string(),
    }))
}

async fn reset_password_handler<R>(
    State(state): State<AuthState<R>>,
    connection_info: ConnectionInfo,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .postern
        .reset_password(
            &payload.token,
            &payload.password,
            connection_info.ip.as_deref(),
            connection_info.user_agent.as_deref(),
        )
        .await?;

    Ok(Json(ResetPasswordResponse { success: true }))
}

async fn verify_reset_token_handler<R>(
    State(state): State<AuthState<R>>,
    Query(query): Query<ResetTokenQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let token = query.token.ok_or(ApiError::MissingParameter("token"))?;

    // An invalid token is a valid:false payload, never an error
    let probe = state.postern.verify_reset_token(&token).await?;

    Ok(Json(VerifyResetTokenResponse {
        success: true,
        valid: probe.valid,
        email: probe.masked_email,
    }))
}

async fn locked_accounts_handler<R>(
    State(state): State<AuthState<R>>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let accounts = state.postern.lockout().locked_accounts().await?;
    let stats = state.postern.lockout().lockout_stats().await?;

    Ok(Json(LockedAccountsResponse { accounts, stats }))
}

async fn unlock_account_handler<R>(
    State(state): State<AuthState<R>>,
    connection_info: ConnectionInfo,
    Json(payload): Json<UnlockAccountRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let unlocked = state
        .postern
        .lockout()
        .unlock_account(
            &payload.email,
            connection_info.ip.as_deref(),
            connection_info.user_agent.as_deref(),
        )
        .await?;

    Ok(Json(UnlockAccountResponse {
        success: true,
        unlocked,
    }))
}

async fn audit_log_handler<R>(
    State(state): State<AuthState<R>>,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let action = query
        .action
        .as_deref()
        .map(str::parse::<AuditAction>)
        .transpose()
        .map_err(ApiError::InvalidRequest)?;

    let events = state
        .postern
        .audit()
        .all_audit_logs(query.limit.unwrap_or(DEFAULT_ADMIN_LOG_LIMIT), action)
        .await;

    Ok(Json(AuditLogResponse { events }))
}

async fn audit_stats_handler<R>(
    State(state): State<AuthState<R>>,
    Query(query): Query<AuditStatsQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let stats = state
        .postern
        .audit()
        .audit_stats(query.days.unwrap_or(DEFAULT_STATS_WINDOW_DAYS))
        .await;

    Ok(Json(AuditStatsResponse { stats }))
}

async fn user_audit_log_handler<R>(
    State(state): State<AuthState<R>>,
    Query(query): Query<UserAuditLogQuery>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let email = query.email.ok_or(ApiError::MissingParameter("email"))?;

    let logs = state
        .postern
        .audit()
        .user_audit_logs(&email, query.limit.unwrap_or(DEFAULT_USER_LOG_LIMIT))
        .await;

    Ok(Json(UserAuditLogResponse {
        user: logs.user,
        events: logs.events,
    }))
}

/// Maintenance sweep for an external scheduler (cron, a scheduled function)
/// to hit periodically. Runs all three cleanups and reports what moved.
async fn cleanup_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let lockouts_affected = state.postern.lockout().cleanup_expired_lockouts().await?;
    let audit_entries_deleted = state
        .postern
        .audit()
        .cleanup_old_logs(DEFAULT_RETENTION_DAYS)
        .await?;
    let reset_tokens_deleted = state
        .postern
        .password_reset()
        .cleanup_expired_reset_tokens()
        .await?;

    Ok(Json(CleanupResponse {
        lockouts_affected,
        audit_entries_deleted,
        reset_tokens_deleted,
    }))
}
