//! Try-on session records and request payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pulse_threads_core::{
    BodyMeasurements, ClothingCategory, ModelType, Outfit, ProductId, TryOnItemId,
    TryOnSessionId, UserId,
};

use crate::validation::{MAX_NAME_LENGTH, ValidationErrors};

/// A try-on session. The anonymous owner token is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct TryOnSession {
    pub id: TryOnSessionId,
    pub user_id: Option<UserId>,
    pub model_type: ModelType,
    pub has_user_photo: bool,
    pub body_measurements: BodyMeasurements,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields shown next to a worn item.
#[derive(Debug, Clone, Serialize)]
pub struct TryOnProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub try_on_model_path: Option<String>,
}

/// An item worn in a session.
#[derive(Debug, Clone, Serialize)]
pub struct TryOnItem {
    pub id: TryOnItemId,
    pub clothing_category: ClothingCategory,
    pub size: Option<String>,
    pub color_variant: Option<String>,
    pub position_data: Option<serde_json::Value>,
    pub product: TryOnProduct,
    pub created_at: DateTime<Utc>,
}

/// Session plus its items arranged on the model.
#[derive(Debug, Clone, Serialize)]
pub struct TryOnSessionDetail {
    #[serde(flatten)]
    pub session: TryOnSession,
    pub outfit: Outfit<TryOnItem>,
    pub item_count: usize,
}

impl TryOnSessionDetail {
    /// Arrange items (oldest first) into an outfit.
    #[must_use]
    pub fn new(session: TryOnSession, items: Vec<TryOnItem>) -> Self {
        let outfit = Outfit::from_items(items.into_iter().map(|i| (i.clothing_category, i)));
        Self {
            item_count: outfit.len(),
            session,
            outfit,
        }
    }
}

/// Result of putting an item on the model.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedItem {
    pub item: TryOnItem,
    /// The garment this item displaced from its category.
    pub replaced_item_id: Option<TryOnItemId>,
}

/// Validated input for a new session, assembled from a multipart form.
#[derive(Debug, Clone, Copy)]
pub struct NewTryOnSession {
    pub model_type: ModelType,
    pub has_user_photo: bool,
    pub body_measurements: BodyMeasurements,
}

/// `POST /api/try-on/add-item` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AddTryOnItem {
    pub session_id: TryOnSessionId,
    pub product_id: ProductId,
    pub clothing_category: String,
    pub size: Option<String>,
    pub color_variant: Option<String>,
    pub position_data: Option<serde_json::Value>,
}

impl AddTryOnItem {
    /// Parse the category and check option lengths.
    ///
    /// # Errors
    ///
    /// Returns every invalid field, including an unknown category.
    pub fn validate(&self) -> Result<ClothingCategory, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let category = self
            .clothing_category
            .parse::<ClothingCategory>()
            .map_err(|_| {
                errors.add(
                    "clothing_category",
                    "The clothing category must be one of top, bottom, shoes, full_outfit, accessories.",
                );
            })
            .ok();
        errors.max_length("size", self.size.as_deref(), MAX_NAME_LENGTH);
        errors.max_length("color_variant", self.color_variant.as_deref(), MAX_NAME_LENGTH);
        if self.position_data.as_ref().is_some_and(|p| !p.is_object()) {
            errors.add("position_data", "The position data field must be an object.");
        }
        match category {
            Some(category) if errors.is_empty() => Ok(category),
            _ => Err(errors),
        }
    }
}

/// `DELETE /api/try-on/remove-item` body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RemoveTryOnItem {
    pub session_id: TryOnSessionId,
    pub item_id: TryOnItemId,
}

/// `POST /api/try-on/add-all-to-cart` body.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TryOnSessionRef {
    pub session_id: TryOnSessionId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, category: ClothingCategory) -> TryOnItem {
        TryOnItem {
            id: TryOnItemId::new(id),
            clothing_category: category,
            size: None,
            color_variant: None,
            position_data: None,
            product: TryOnProduct {
                id: ProductId::new(id),
                name: format!("Product {id}"),
                slug: format!("product-{id}"),
                price: Decimal::ONE_HUNDRED,
                sale_price: None,
                image_url: None,
                try_on_model_path: None,
            },
            created_at: Utc::now(),
        }
    }

    fn session() -> TryOnSession {
        TryOnSession {
            id: TryOnSessionId::new(1),
            user_id: None,
            model_type: ModelType::ThreeDModel,
            has_user_photo: false,
            body_measurements: BodyMeasurements::default(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_detail_groups_items() {
        let detail = TryOnSessionDetail::new(
            session(),
            vec![
                item(1, ClothingCategory::Top),
                item(2, ClothingCategory::Accessories),
                item(3, ClothingCategory::Accessories),
            ],
        );
        assert_eq!(detail.item_count, 3);
        assert_eq!(
            detail.outfit.garment(ClothingCategory::Top).map(|i| i.id),
            Some(TryOnItemId::new(1))
        );

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["model_type"], "3d_model");
        assert_eq!(json["outfit"]["accessories"].as_array().map(Vec::len), Some(2));
        assert!(json.get("session_token").is_none());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let payload: AddTryOnItem = serde_json::from_value(serde_json::json!({
            "session_id": 1,
            "product_id": 2,
            "clothing_category": "hat",
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.get("clothing_category").is_some());
    }

    #[test]
    fn test_known_category_accepted() {
        let payload: AddTryOnItem = serde_json::from_value(serde_json::json!({
            "session_id": 1,
            "product_id": 2,
            "clothing_category": "full_outfit",
            "size": "M",
        }))
        .unwrap();
        assert_eq!(payload.validate().unwrap(), ClothingCategory::FullOutfit);
    }
}
