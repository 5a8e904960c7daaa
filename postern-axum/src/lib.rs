//! Ready-to-use Axum routes for the postern security toolkit
//!
//! Exposes the password reset surface and the admin lockout/audit views over
//! a [`postern::Postern`] instance:
//!
//! - `POST /auth/forgot-password` — request a reset; uniform response
//!   regardless of account existence
//! - `POST /auth/reset-password` — complete a reset with a token
//! - `GET /auth/reset-password?token=…` — token validity probe
//! - `GET /admin/lockouts`, `POST /admin/lockouts/unlock` — locked-account
//!   dashboard and manual unlock
//! - `GET /admin/audit`, `GET /admin/audit/stats`, `GET /admin/audit/user` —
//!   audit log views
//! - `POST /admin/maintenance/cleanup` — retention sweep for an external
//!   scheduler
//!
//! The `/admin` routes return full detail (emails, attempt counts, remaining
//! lock time) and must sit behind the embedding application's own
//! authentication middleware.

pub mod error;
pub mod extractors;
pub mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{AuthState, create_router};
pub use types::ConnectionInfo;
