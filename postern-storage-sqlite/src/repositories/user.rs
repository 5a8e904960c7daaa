//! SQLite implementation of the user repository.

use async_trait::async_trait;
use chrono::DateTime;
use postern_core::{
    Error, NewUser, User, UserId, error::StorageError, repositories::UserRepository,
};
use sqlx::SqlitePool;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    email: String,
    name: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteUser> for User {
    fn from(row: SqliteUser) -> Self {
        User {
            id: UserId::from(row.id),
            email: row.email,
            name: row.name,
            created_at: DateTime::from_timestamp(row.created_at, 0).expect("Invalid timestamp"),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).expect("Invalid timestamp"),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (id, email, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, email, name, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, email, name, created_at, updated_at FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(row.map(Into::into))
    }
}
