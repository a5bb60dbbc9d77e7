//! Append-only price change log.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pulse_threads_core::{ParseEnumError, PriceHistoryId, UserId};

use crate::validation::{MAX_NAME_LENGTH, ValidationErrors};

/// Kind of record a price belongs to.
///
/// Stored as text in `mall.price_history.priceable_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priceable {
    Product,
    ProductVariation,
}

impl Priceable {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::ProductVariation => "product_variation",
        }
    }
}

impl FromStr for Priceable {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(Self::Product),
            "product_variation" => Ok(Self::ProductVariation),
            _ => Err(ParseEnumError {
                kind: "priceable type",
                value: s.to_owned(),
            }),
        }
    }
}

/// One logged price change.
#[derive(Debug, Clone, Serialize)]
pub struct PriceHistoryEntry {
    pub id: PriceHistoryId,
    pub priceable_type: Priceable,
    pub priceable_id: i32,
    pub old_price: Option<Decimal>,
    pub new_price: Decimal,
    pub old_sale_price: Option<Decimal>,
    pub new_sale_price: Option<Decimal>,
    pub changed_by: Option<UserId>,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Payload for a price update on a product or variation.
///
/// `sale_price: null` clears the sale; omitting it keeps the current one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceChange {
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_price: Option<Option<Decimal>>,
    pub reason: Option<String>,
}

impl PriceChange {
    /// Check field rules.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.price {
            None => errors.add("price", "The price field is required."),
            Some(p) => errors.price("price", Some(p)),
        }
        errors.price("sale_price", self.sale_price.flatten());
        errors.max_length("reason", self.reason.as_deref(), MAX_NAME_LENGTH);
        errors.into_result()
    }

    /// Sale price after applying this change to `current`.
    #[must_use]
    pub fn resolve_sale_price(&self, current: Option<Decimal>) -> Option<Decimal> {
        self.sale_price.unwrap_or(current)
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Decimal>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_price_null_clears() {
        let change: PriceChange =
            serde_json::from_str(r#"{"price": "100.00", "sale_price": null}"#).unwrap();
        assert_eq!(change.resolve_sale_price(Some(Decimal::TEN)), None);
    }

    #[test]
    fn test_sale_price_absent_keeps_current() {
        let change: PriceChange = serde_json::from_str(r#"{"price": "100.00"}"#).unwrap();
        assert_eq!(change.resolve_sale_price(Some(Decimal::TEN)), Some(Decimal::TEN));
    }

    #[test]
    fn test_price_required() {
        let errors = PriceChange::default().validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["price"]);
    }

    #[test]
    fn test_price_above_column_limit() {
        let change: PriceChange =
            serde_json::from_str(r#"{"price": "100000000000", "sale_price": "10000000000"}"#)
                .unwrap();
        let errors = change.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["price", "sale_price"]
        );
    }

    #[test]
    fn test_priceable_round_trip_text() {
        assert_eq!(
            "product_variation".parse::<Priceable>(),
            Ok(Priceable::ProductVariation)
        );
        assert!("order".parse::<Priceable>().is_err());
    }
}
