//! User management commands.
//!
//! There is no sign-up endpoint: store owners and admins are created here.

use pulse_threads_core::{Email, UserRole};
use pulse_threads_storefront::db::{RepositoryError, UserRepository};

/// Create a user with the given role.
///
/// # Errors
///
/// Returns an error if the email or role is invalid, the email is already
/// registered, or the database is unreachable.
pub async fn create(email: &str, name: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let role: UserRole = role.parse()?;
    let name = name.trim();
    if name.is_empty() {
        return Err("Name must not be empty".into());
    }

    let pool = super::connect().await?;
    let user = match UserRepository::new(&pool).create(&email, name, role).await {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            return Err(format!("A user with email {email} already exists").into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(id = %user.id, email = %user.email, role = %user.role, "User created");
    Ok(())
}

/// Change the role of the user with `email`.
///
/// # Errors
///
/// Returns an error if the role is invalid, no such user exists, or the
/// database is unreachable.
pub async fn set_role(email: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let role: UserRole = role.parse()?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| format!("No user with email {email}"))?;

    let updated = users.set_role(user.id, role).await?;
    tracing::info!(
        id = %updated.id,
        from = %user.role,
        to = %updated.role,
        "User role changed"
    );
    Ok(())
}
