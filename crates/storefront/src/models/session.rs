//! Session-related types.
//!
//! The mall does not log users in itself; an upstream auth layer writes
//! [`CurrentUser`] into the session and the API only reads it.

use serde::{Deserialize, Serialize};

use pulse_threads_core::{Email, UserId, UserRole};

/// Session-stored user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Role at sign-in time.
    pub role: UserRole,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous shopper token that owns carts and try-on sessions.
    pub const SHOPPER_TOKEN: &str = "shopper_token";
}
