//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! the lockout, audit, and password reset logic.

pub mod audit;
pub mod lockout;
pub mod mailer;
pub mod password_reset;

pub use audit::{AuditService, UnlockMethod, UserAuditLogs};
pub use lockout::{AccountLockoutService, LockoutDecision};
pub use mailer::MailerService;
pub use password_reset::{PasswordResetService, TokenProbe};
