//! Virtual try-on route handlers.
//!
//! Sessions and their items are scoped to the caller: another shopper's
//! session id behaves exactly like one that does not exist.

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
};
use serde_json::{Value, json};
use tracing::instrument;

use pulse_threads_core::{BodyMeasurements, ModelType, TryOnSessionId};

use crate::db::{ProductRepository, TryOnRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::CurrentOwner;
use crate::models::{
    AddTryOnItem, NewTryOnSession, ProductView, RemoveTryOnItem, TryOnSessionDetail,
    TryOnSessionRef,
};
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// Largest accepted user photo (10 MiB).
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for session creation: the photo plus form overhead.
pub const SESSION_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 2 * 1024 * 1024;

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}

/// An uploaded photo, reduced to what validation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub content_type: Option<String>,
    pub size: usize,
}

/// Raw fields of the multipart session form.
#[derive(Debug, Default)]
pub struct SessionForm {
    pub model_type: Option<String>,
    pub user_photo: Option<PhotoUpload>,
    /// `(measurement name, raw value)` pairs.
    pub measurements: Vec<(String, String)>,
}

impl SessionForm {
    /// Read every part of the multipart body.
    ///
    /// Measurements may arrive as `body_measurements[height]` or plain
    /// `height`. Unknown parts are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(multipart: &mut Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "model_type" => form.model_type = Some(field.text().await?),
                "user_photo" => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    form.user_photo = Some(PhotoUpload {
                        content_type,
                        size: bytes.len(),
                    });
                }
                other => {
                    let key = other
                        .strip_prefix("body_measurements[")
                        .and_then(|rest| rest.strip_suffix(']'))
                        .unwrap_or(other);
                    if BodyMeasurements::FIELDS.contains(&key) {
                        form.measurements.push((key.to_string(), field.text().await?));
                    }
                }
            }
        }
        Ok(form)
    }

    /// Check the form and build the session to create.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> std::result::Result<NewTryOnSession, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let model_type = match self.model_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("model_type", "The model type field is required.");
                None
            }
            Some(raw) => raw.parse::<ModelType>().map_or_else(
                |_| {
                    errors.add("model_type", "The selected model type is invalid.");
                    None
                },
                Some,
            ),
        };

        if let Some(photo) = &self.user_photo {
            let is_image = photo
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("image/"));
            if !is_image {
                errors.add("user_photo", "The user photo must be an image.");
            }
            if photo.size > MAX_PHOTO_BYTES {
                errors.add(
                    "user_photo",
                    "The user photo must not be greater than 10240 kilobytes.",
                );
            }
        } else if model_type.is_some_and(ModelType::requires_photo) {
            errors.add(
                "user_photo",
                "The user photo field is required when model type is user_photo.",
            );
        }

        let mut body_measurements = BodyMeasurements::default();
        for (name, raw) in &self.measurements {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    body_measurements.set(name, value);
                }
                _ => errors.add(
                    &format!("body_measurements.{name}"),
                    format!("The body measurements.{name} field must be a number."),
                ),
            }
        }

        errors.into_result()?;
        let model_type = model_type.ok_or_else(|| {
            ValidationErrors::single("model_type", "The model type field is required.")
        })?;
        Ok(NewTryOnSession {
            model_type,
            has_user_photo: self.user_photo.is_some(),
            body_measurements,
        })
    }
}

/// Products that can be tried on.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_try_on().await?))
}

/// Start a try-on session from a multipart form.
#[instrument(skip(state, owner, multipart))]
pub async fn create_session(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let input = SessionForm::read(&mut multipart).await?.validate()?;
    let session = TryOnRepository::new(state.pool())
        .create(&owner, &input)
        .await?;

    tracing::info!(
        session_id = %session.id,
        model_type = %session.model_type,
        "Try-on session created"
    );
    Ok(Json(json!({
        "success": true,
        "session_id": session.id,
        "message": "Try-on session created successfully",
    })))
}

/// A session with its outfit.
#[instrument(skip(state, owner))]
pub async fn show_session(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<TryOnSessionId>,
) -> Result<Json<TryOnSessionDetail>> {
    let detail = TryOnRepository::new(state.pool())
        .get_detail(&owner, id)
        .await?;
    Ok(Json(detail))
}

/// Put a product on the model, replacing any garment in the same category.
#[instrument(skip(state, owner, input), fields(session_id = %input.session_id))]
pub async fn add_item(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(input): ApiJson<AddTryOnItem>,
) -> Result<Json<Value>> {
    let category = input.validate()?;
    let placed = TryOnRepository::new(state.pool())
        .add_item(&owner, &input, category)
        .await?;

    if let Some(replaced) = placed.replaced_item_id {
        tracing::debug!(%replaced, %category, "Replaced garment");
    }
    Ok(Json(json!({
        "success": true,
        "item": placed.item,
        "replaced_item_id": placed.replaced_item_id,
        "message": "Item added to try-on session",
    })))
}

/// Take one item off the model.
#[instrument(skip(state, owner))]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(input): ApiJson<RemoveTryOnItem>,
) -> Result<Json<Value>> {
    TryOnRepository::new(state.pool())
        .remove_item(&owner, input.session_id, input.item_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Item removed from try-on session",
    })))
}

/// Copy every item of the session into the caller's cart.
///
/// Each call adds fresh lines; calling it twice adds everything twice.
#[instrument(skip(state, owner))]
pub async fn add_all_to_cart(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    ApiJson(input): ApiJson<TryOnSessionRef>,
) -> Result<Json<Value>> {
    let added = TryOnRepository::new(state.pool())
        .add_all_to_cart(&owner, input.session_id)
        .await?;

    let session_id = input.session_id.to_string();
    add_breadcrumb(
        "try_on",
        "Outfit added to cart",
        Some(&[("session_id", session_id.as_str())]),
    );
    Ok(Json(json!({
        "success": true,
        "items_added": added,
        "message": "All items added to cart successfully",
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(model_type: &str) -> SessionForm {
        SessionForm {
            model_type: Some(model_type.to_string()),
            ..SessionForm::default()
        }
    }

    fn jpeg(size: usize) -> Option<PhotoUpload> {
        Some(PhotoUpload {
            content_type: Some("image/jpeg".to_string()),
            size,
        })
    }

    #[test]
    fn test_three_d_model_needs_no_photo() {
        let session = form("3d_model").validate().unwrap();
        assert_eq!(session.model_type, ModelType::ThreeDModel);
        assert!(!session.has_user_photo);
        assert!(session.body_measurements.is_empty());
    }

    #[test]
    fn test_user_photo_requires_photo() {
        let errors = form("user_photo").validate().unwrap_err();
        assert!(errors.get("user_photo").is_some());

        let mut with_photo = form("user_photo");
        with_photo.user_photo = jpeg(2048);
        assert!(with_photo.validate().unwrap().has_user_photo);
    }

    #[test]
    fn test_model_type_required_and_known() {
        let errors = SessionForm::default().validate().unwrap_err();
        assert!(errors.get("model_type").is_some());

        let errors = form("hologram").validate().unwrap_err();
        assert_eq!(
            errors.get("model_type").unwrap(),
            ["The selected model type is invalid.".to_string()]
        );
    }

    #[test]
    fn test_photo_type_and_size() {
        let mut not_image = form("user_photo");
        not_image.user_photo = Some(PhotoUpload {
            content_type: Some("application/pdf".to_string()),
            size: 10,
        });
        assert!(not_image.validate().is_err());

        let mut too_big = form("user_photo");
        too_big.user_photo = jpeg(MAX_PHOTO_BYTES + 1);
        assert!(too_big.validate().is_err());

        let mut at_limit = form("user_photo");
        at_limit.user_photo = jpeg(MAX_PHOTO_BYTES);
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_measurements_must_be_numeric() {
        let mut f = form("3d_model");
        f.measurements = vec![
            ("height".to_string(), "172.5".to_string()),
            ("waist".to_string(), String::new()),
            ("chest".to_string(), "broad".to_string()),
        ];
        let errors = f.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["body_measurements.chest"]
        );

        f.measurements.pop();
        let session = f.validate().unwrap();
        assert_eq!(session.body_measurements.height, Some(172.5));
        assert_eq!(session.body_measurements.waist, None);
    }

    #[test]
    fn test_non_finite_measurement_rejected() {
        let mut f = form("3d_model");
        f.measurements = vec![("hips".to_string(), "NaN".to_string())];
        assert!(f.validate().is_err());
    }
}
