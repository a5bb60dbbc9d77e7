//! Request body extractors that reject with the API's JSON error shape.

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::error::AppError;

/// `axum::Json` whose rejection renders as an [`AppError`].
///
/// Malformed or mistyped bodies become a 400 instead of axum's plain-text 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
