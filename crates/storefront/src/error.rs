//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error renders as
//! `{"success": false, "message": ..., "errors": {...}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::search::SearchError;
use crate::validation::ValidationErrors;

/// Application-level error type for the mall API.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more request fields are invalid.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Search index operation failed.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Resource not found. Holds the resource name, e.g. `"Product"`.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// No signed-in user.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed-in user lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(resource) => Self::NotFound(resource),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Database(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {err}"))
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Search(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convenience constructor for a single invalid field.
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(errors) => json!({
                "success": false,
                "message": "The given data was invalid.",
                "errors": errors,
            }),
            Self::Database(_) | Self::Search(_) | Self::Internal(_) => json!({
                "success": false,
                "message": "Internal server error",
            }),
            Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::BadRequest(message)
            | Self::Conflict(message) => json!({
                "success": false,
                "message": message,
            }),
            other @ Self::NotFound(_) => json!({
                "success": false,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::NotFound("Product").to_string(), "Product not found");
        assert_eq!(
            AppError::BadRequest("invalid input".to_string()).to_string(),
            "Bad request: invalid input"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::NotFound("Item")), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::invalid("name", "required")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("taken".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_errors() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound("Try-on session")),
            AppError::NotFound("Try-on session")
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("sku".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::DataCorruption("bad".into())),
            AppError::Database(_)
        ));
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let response = AppError::invalid("model_type", "The model type field is required.")
            .into_response();
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["errors"]["model_type"][0],
            "The model type field is required."
        );
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let response = AppError::Internal("connection refused to 10.0.0.3".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let body = body_json(AppError::NotFound("Item").into_response()).await;
        assert_eq!(body["message"], "Item not found");
    }
}
