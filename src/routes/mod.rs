pub mod exec;
pub mod export;
pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth, cors::permissive_cors, rate_limit};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let action_api = Router::new()
        .route("/exec", get(exec::exec_get).post(exec::exec_post))
        .route("/api/exec", get(exec::exec_get).post(exec::exec_post));

    let export_api = Router::new()
        .route(
            "/api/reports/:report_type/export",
            get(export::export_report),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_auth,
        ));

    let api = action_api
        .merge(export_api)
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(state.config.api_rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}
