//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pulse_threads_core::{Email, UserId, UserRole};

/// A mall user (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
