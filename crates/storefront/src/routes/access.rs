//! What a catalog manager may touch.

use pulse_threads_core::{StorefrontId, UserRole};

use crate::db::StorefrontRepository;
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, Storefront};
use crate::state::AppState;

/// The slice of the mall a manager can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageScope {
    /// Admins manage every storefront.
    Everything,
    /// Store owners manage only their own storefront.
    Storefront(StorefrontId),
}

impl ManageScope {
    /// Resolve the scope of a user already known to be a manager.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for a store owner without a storefront.
    pub async fn resolve(state: &AppState, user: &CurrentUser) -> Result<Self> {
        if user.role == UserRole::Admin {
            return Ok(Self::Everything);
        }
        let owned = StorefrontRepository::new(state.pool())
            .get_by_owner(user.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("You do not own a storefront yet.".to_string()))?;
        Ok(Self::Storefront(owned.id))
    }

    /// Check that a product or storefront belonging to `storefront` is in scope.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when it is not.
    pub fn check(self, storefront: Option<StorefrontId>) -> Result<()> {
        match self {
            Self::Everything => Ok(()),
            Self::Storefront(own) if storefront == Some(own) => Ok(()),
            Self::Storefront(_) => Err(AppError::Forbidden(
                "You can only manage your own storefront.".to_string(),
            )),
        }
    }
}

/// Whether `user` may edit `storefront`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for a store owner editing someone else's shop.
pub fn check_storefront_owner(user: &CurrentUser, storefront: &Storefront) -> Result<()> {
    if user.role == UserRole::Admin || storefront.owner_id == Some(user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only manage your own storefront.".to_string(),
        ))
    }
}
