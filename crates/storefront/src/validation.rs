//! Field-level validation errors for request payloads.
//!
//! Handlers collect every problem with a payload before responding, so the
//! client sees all invalid fields at once.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// Maximum length for names and other short text fields.
pub const MAX_NAME_LENGTH: usize = 255;

/// Largest amount a `NUMERIC(12, 2)` price column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error set with a single message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a problem with `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Field names with errors, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` if nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field is invalid.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Require a non-blank string no longer than `max` characters.
    pub fn require_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        match value.map(str::trim) {
            None | Some("") => self.add(field, format!("The {field} field is required.")),
            Some(v) if v.chars().count() > max => self.add(
                field,
                format!("The {field} field must not be greater than {max} characters."),
            ),
            Some(_) => {}
        }
    }

    /// Optional string no longer than `max` characters.
    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) {
        if value.is_some_and(|v| v.chars().count() > max) {
            self.add(
                field,
                format!("The {field} field must not be greater than {max} characters."),
            );
        }
    }

    /// Optional amount that must not be negative.
    pub fn non_negative(&mut self, field: &str, value: Option<Decimal>) {
        if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
            self.add(field, format!("The {field} field must be at least 0."));
        }
    }

    /// Optional amount no greater than `max`.
    pub fn max_decimal(&mut self, field: &str, value: Option<Decimal>, max: Decimal) {
        if value.is_some_and(|v| v > max) {
            self.add(
                field,
                format!("The {field} field must not be greater than {max}."),
            );
        }
    }

    /// Optional money amount: not negative and small enough for a price column.
    pub fn price(&mut self, field: &str, value: Option<Decimal>) {
        self.non_negative(field, value);
        self.max_decimal(field, value, MAX_PRICE);
    }

    /// Optional URL that must be absolute http(s).
    pub fn url(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value else { return };
        let valid = url::Url::parse(value)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host());
        if !valid {
            self.add(field, format!("The {field} field must be a valid URL."));
        }
    }

    /// Optional `#rrggbb` hex colour.
    pub fn hex_color(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value else { return };
        if !is_hex_color(value) {
            self.add(
                field,
                format!("The {field} field must be a hex colour like #4f46e5."),
            );
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// `#` followed by exactly six hex digits.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
