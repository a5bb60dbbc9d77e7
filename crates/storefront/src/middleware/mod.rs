//! HTTP middleware stack for the mall API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting (governor, chat and checkout only)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{CurrentOwner, RequireManager, set_current_user};
pub use rate_limit::{chat_rate_limiter, checkout_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, session_layer};
