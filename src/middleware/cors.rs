use axum::http::{header, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Browsers call the action router from any origin, so preflight is
/// always answered.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(86400))
}
