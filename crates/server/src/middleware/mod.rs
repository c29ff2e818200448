//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//!
//! Authentication is per-handler through the [`RequireAuth`] extractor.

pub mod auth;
pub mod cors;
pub mod request_id;

pub use auth::RequireAuth;
pub use cors::cors_layer;
pub use request_id::{RequestId, request_id_middleware};
