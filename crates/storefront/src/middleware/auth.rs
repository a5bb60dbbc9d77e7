//! Authentication and ownership extractors.
//!
//! Handlers never read the session directly: these extractors resolve who is
//! calling once, at the request boundary.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use pulse_threads_core::{CartOwner, SessionToken};

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

fn session(parts: &Parts) -> Result<&Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
}

async fn current_user(session: &Session) -> Result<Option<CurrentUser>, AppError> {
    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?)
}

/// Extractor that requires a store owner or admin.
///
/// Rejects with 401 when nobody is signed in and 403 when the signed-in user
/// is a plain customer. Whether the user may touch a *particular* storefront
/// is checked by the handler.
pub struct RequireManager(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireManager
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(session(parts)?)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Sign in to manage the catalog.".to_string()))?;

        if !user.role.can_manage_catalog() {
            return Err(AppError::Forbidden(
                "Only store owners and admins can manage the catalog.".to_string(),
            ));
        }

        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Extractor resolving the owner of the caller's cart and try-on sessions.
///
/// A signed-in user owns by user id. Anyone else owns by an anonymous shopper
/// token, minted and stored in the session on first use.
pub struct CurrentOwner(pub CartOwner);

impl<S> FromRequestParts<S> for CurrentOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session(parts)?;

        if let Some(user) = current_user(session).await? {
            return Ok(Self(CartOwner::Authenticated(user.id)));
        }

        let token = match session
            .get::<SessionToken>(session_keys::SHOPPER_TOKEN)
            .await?
        {
            Some(token) => token,
            None => {
                let token = SessionToken::generate();
                session.insert(session_keys::SHOPPER_TOKEN, token).await?;
                tracing::debug!(shopper_token = %token, "Issued anonymous shopper token");
                token
            }
        };

        Ok(Self(CartOwner::Anonymous(token)))
    }
}

/// Helper to set the current user in the session.
///
/// Called by the upstream sign-in flow and by tests.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}
