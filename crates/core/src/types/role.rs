//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted enum value is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Role of a mall user.
///
/// Stored as text in `mall.user.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shops, carts, and tries things on.
    #[default]
    Customer,
    /// Manages exactly one storefront and its products.
    StoreOwner,
    /// Manages every storefront.
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::StoreOwner => "store_owner",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may use catalog and storefront management endpoints.
    #[must_use]
    pub const fn can_manage_catalog(self) -> bool {
        matches!(self, Self::StoreOwner | Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "store_owner" => Ok(Self::StoreOwner),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError::new("user role", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::Customer, UserRole::StoreOwner, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_only_owners_and_admins_manage() {
        assert!(!UserRole::Customer.can_manage_catalog());
        assert!(UserRole::StoreOwner.can_manage_catalog());
        assert!(UserRole::Admin.can_manage_catalog());
    }
}
