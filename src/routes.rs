use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::rate_limit::rate_limit_submissions;
use crate::handlers;
use crate::AppState;

/// One route per user action: submit, date change, refresh.
pub fn build_router(state: AppState) -> Router {
    // Only submissions are throttled; reads on the same path are not.
    let moods = post(handlers::moods::log_mood)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_submissions,
        ))
        .get(handlers::moods::list_moods);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/moods/catalog", get(handlers::moods::get_catalog))
        .route("/api/moods", moods)
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/api/refresh", post(handlers::moods::refresh))
        .with_state(state)
}
