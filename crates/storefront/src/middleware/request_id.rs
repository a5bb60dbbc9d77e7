//! Request ID middleware for request tracing and correlation.
//!
//! An `x-request-id` from an upstream proxy is kept when it looks sane;
//! otherwise a UUID v4 is minted. The ID lands in the `http_request` span, the
//! Sentry scope and the response headers.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID we pass through.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id =
        upstream_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// The proxy-supplied ID, if it is non-empty printable ASCII of sane length.
fn upstream_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let acceptable = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LENGTH
        && value.bytes().all(|b| b.is_ascii_graphic());
    acceptable.then(|| value.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_upstream_id_is_kept() {
        assert_eq!(
            upstream_request_id(&headers("cf-8a1b2c")),
            Some("cf-8a1b2c".to_string())
        );
    }

    #[test]
    fn test_missing_or_odd_ids_are_replaced() {
        assert_eq!(upstream_request_id(&HeaderMap::new()), None);
        assert_eq!(upstream_request_id(&headers("   ")), None);
        assert_eq!(upstream_request_id(&headers("has space")), None);
        assert_eq!(upstream_request_id(&headers(&"a".repeat(200))), None);
    }
}
