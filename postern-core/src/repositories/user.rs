use crate::{Error, NewUser, User, UserId};
use async_trait::async_trait;

/// Repository for user identity data access
///
/// The security subsystem only needs to create users (bootstrap/tests) and
/// resolve them by id or email. Emails passed in are expected to already be
/// normalized by the calling service.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;
}
