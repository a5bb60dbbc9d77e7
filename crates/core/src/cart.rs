//! Cart ownership, line attributes, and totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ParseEnumError, UserId};

/// Opaque token identifying an anonymous shopper across requests.
///
/// Lives in the server-side session; never sent in a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Who a cart or try-on session belongs to.
///
/// Exactly one of user or session token, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOwner {
    Anonymous(SessionToken),
    Authenticated(UserId),
}

impl CartOwner {
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Authenticated(id) => Some(*id),
            Self::Anonymous(_) => None,
        }
    }

    #[must_use]
    pub const fn session_token(&self) -> Option<SessionToken> {
        match self {
            Self::Anonymous(token) => Some(*token),
            Self::Authenticated(_) => None,
        }
    }
}

/// Options recorded on a cart line.
///
/// Two lines for the same product merge only when their attributes match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_variant: Option<String>,
    /// Set when the line was added from a try-on session.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub from_try_on: bool,
}

/// Flat shipping charge applied to every order.
#[must_use]
pub const fn flat_shipping() -> Decimal {
    Decimal::from_parts(500, 0, 0, false, 2)
}

/// Aggregate numbers for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    /// Distinct lines.
    pub line_count: usize,
    /// Sum of quantities.
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl CartTotals {
    /// Compute totals from `(unit_price, quantity)` pairs.
    pub fn from_lines(lines: impl IntoIterator<Item = (Decimal, i32)>) -> Self {
        let mut totals = Self {
            line_count: 0,
            item_count: 0,
            subtotal: Decimal::ZERO,
        };
        for (price, quantity) in lines {
            totals.line_count += 1;
            totals.item_count += i64::from(quantity);
            totals.subtotal += price * Decimal::from(quantity);
        }
        totals
    }

    /// Subtotal plus flat shipping.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal + flat_shipping()
    }
}

/// How the shopper pays at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Credit,
    Paypal,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Paypal => "paypal",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "paypal" => Ok(Self::Paypal),
            _ => Err(ParseEnumError::new("payment method", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    #[test]
    fn test_totals() {
        let totals = CartTotals::from_lines([(dec("45.00"), 2), (dec("120.50"), 1)]);
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, dec("210.50"));
        assert_eq!(totals.total(), dec("215.50"));
    }

    #[test]
    fn test_empty_cart_totals() {
        let totals = CartTotals::from_lines([]);
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total(), dec("5.00"));
    }

    #[test]
    fn test_attributes_skip_defaults() {
        let attrs = LineAttributes {
            size: Some("M".into()),
            ..LineAttributes::default()
        };
        let json = serde_json::to_string(&attrs).unwrap_or_default();
        assert_eq!(json, r#"{"size":"M"}"#);

        let from_try_on = LineAttributes {
            from_try_on: true,
            ..LineAttributes::default()
        };
        let json = serde_json::to_value(&from_try_on).unwrap_or_default();
        assert_eq!(json["from_try_on"], true);
    }

    #[test]
    fn test_owner_accessors() {
        let token = SessionToken::generate();
        let anon = CartOwner::Anonymous(token);
        assert_eq!(anon.session_token(), Some(token));
        assert_eq!(anon.user_id(), None);

        let user = CartOwner::Authenticated(UserId::new(7));
        assert_eq!(user.user_id(), Some(UserId::new(7)));
        assert_eq!(user.session_token(), None);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("paypal".parse(), Ok(PaymentMethod::Paypal));
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
