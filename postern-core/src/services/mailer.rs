use crate::Error;
use async_trait::async_trait;

/// Outbound email collaborator for the password reset flow.
///
/// Postern issues and verifies tokens; delivering them is the embedding
/// application's job (SMTP, API-based providers, a file sink in dev). The
/// reset service treats delivery failures as non-revealing: they are logged
/// and the caller still receives the uniform success response.
#[async_trait]
pub trait MailerService: Send + Sync {
    /// Send a password reset email carrying the reset token to `to`.
    async fn send_password_reset_email(&self, to: &str, reset_token: &str) -> Result<(), Error>;
}
