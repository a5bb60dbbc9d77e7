//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pulse_threads_core::{Email, UserId, UserRole};

use super::{RepositoryError, parse_column};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: UserId::new(r.id),
            email,
            name: r.name,
            role: parse_column(&r.role)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email or role is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM mall.user WHERE email = $1"))
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO mall.user (email, name, role) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(name)
        .bind(role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already exists"))?;
        row.try_into()
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE mall.user SET role = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound("User"))?.try_into()
    }
}
