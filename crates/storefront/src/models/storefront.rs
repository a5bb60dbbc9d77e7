//! Storefront (tenant shop) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pulse_threads_core::{StorefrontId, UserId, slugify};

use crate::validation::{MAX_NAME_LENGTH, ValidationErrors};

/// Theme colour applied when a storefront does not pick its own.
pub const DEFAULT_PRIMARY_COLOR: &str = "#4f46e5";
/// Secondary theme colour default.
pub const DEFAULT_SECONDARY_COLOR: &str = "#7c3aed";

/// A live storefront.
#[derive(Debug, Clone, Serialize)]
pub struct Storefront {
    pub id: StorefrontId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub owner_id: Option<UserId>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub theme_settings: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront listing entry with its live product count.
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontSummary {
    #[serde(flatten)]
    pub storefront: Storefront,
    pub products_count: i64,
}

/// Payload for creating a storefront.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStorefront {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub theme_settings: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    /// Admins may assign an owner; store owners always own what they create.
    pub owner_id: Option<UserId>,
}

impl NewStorefront {
    /// Check field rules and resolve the slug.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        errors.max_length("slug", self.slug.as_deref(), MAX_NAME_LENGTH);
        validate_presentation(
            &mut errors,
            self.logo_url.as_deref(),
            self.banner_url.as_deref(),
            self.primary_color.as_deref(),
            self.secondary_color.as_deref(),
            self.theme_settings.as_ref(),
        );

        let slug = resolve_slug(self.slug.as_deref(), self.name.as_deref().unwrap_or_default());
        if errors.get("name").is_none() && slug.is_empty() {
            errors.add("slug", "The slug must contain at least one letter or digit.");
        }
        errors.into_result().map(|()| slug)
    }
}

/// Payload for updating a storefront. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorefrontUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub theme_settings: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

impl StorefrontUpdate {
    /// Check the provided fields and normalize a new slug.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<Option<String>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_some() {
            errors.require_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        }
        validate_presentation(
            &mut errors,
            self.logo_url.as_deref(),
            self.banner_url.as_deref(),
            self.primary_color.as_deref(),
            self.secondary_color.as_deref(),
            self.theme_settings.as_ref(),
        );
        let slug = self.slug.as_deref().map(slugify);
        if slug.as_deref() == Some("") {
            errors.add("slug", "The slug must contain at least one letter or digit.");
        }
        errors.max_length("slug", slug.as_deref(), MAX_NAME_LENGTH);
        errors.into_result().map(|()| slug)
    }
}

fn validate_presentation(
    errors: &mut ValidationErrors,
    logo_url: Option<&str>,
    banner_url: Option<&str>,
    primary_color: Option<&str>,
    secondary_color: Option<&str>,
    theme_settings: Option<&serde_json::Value>,
) {
    errors.url("logo_url", logo_url);
    errors.url("banner_url", banner_url);
    errors.hex_color("primary_color", primary_color);
    errors.hex_color("secondary_color", secondary_color);
    if theme_settings.is_some_and(|t| !t.is_object()) {
        errors.add("theme_settings", "The theme settings field must be an object.");
    }
}

/// Explicit slug (normalized) or one derived from the name.
fn resolve_slug(explicit: Option<&str>, name: &str) -> String {
    match explicit.map(str::trim) {
        Some(slug) if !slug.is_empty() => slugify(slug),
        _ => slugify(name),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(name: &str) -> NewStorefront {
        NewStorefront {
            name: Some(name.to_string()),
            ..NewStorefront::default()
        }
    }

    #[test]
    fn test_slug_derived_from_name() {
        assert_eq!(payload("Chitenge Corner").validate(), Ok("chitenge-corner".into()));
    }

    #[test]
    fn test_explicit_slug_is_normalized() {
        let mut p = payload("Chitenge Corner");
        p.slug = Some("Lusaka Shop".into());
        assert_eq!(p.validate(), Ok("lusaka-shop".into()));
    }

    #[test]
    fn test_invalid_presentation_fields() {
        let mut p = payload("Shop");
        p.logo_url = Some("ftp//broken".into());
        p.primary_color = Some("blue".into());
        p.theme_settings = Some(serde_json::json!([1, 2]));
        let errors = p.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["logo_url", "primary_color", "theme_settings"]
        );
    }

    #[test]
    fn test_name_required() {
        let errors = NewStorefront::default().validate().unwrap_err();
        assert!(errors.get("name").is_some());
    }

    #[test]
    fn test_update_rejects_empty_slug() {
        let update = StorefrontUpdate {
            slug: Some("***".into()),
            ..StorefrontUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
