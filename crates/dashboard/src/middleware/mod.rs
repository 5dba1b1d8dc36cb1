//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Auth extractor (per-route, via `RequireUser`)

pub mod auth;
pub mod session;

pub use auth::RequireUser;
pub use session::create_session_layer;
