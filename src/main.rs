use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod routes;
mod services;
mod store;

use auth::rate_limit::RateLimitState;
use config::Config;
use services::mood_log::SnapshotCache;
use store::MoodStore;

#[derive(Clone)]
pub struct AppState {
    pub store: MoodStore,
    pub snapshots: SnapshotCache,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new(
        store: MoodStore,
        snapshot_ttl: Duration,
        submit_limit: u32,
        submit_window_secs: u64,
    ) -> Self {
        Self {
            store,
            snapshots: SnapshotCache::new(snapshot_ttl),
            rate_limiter: RateLimitState::new(submit_limit, submit_window_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mood_tracker_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Credential and destination failures stop startup.
    let store = match MoodStore::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load credentials or connect to the mood store");
            std::process::exit(1);
        }
    };
    match store.ping().await {
        Ok(()) => tracing::info!(backend = store.backend_name(), "Mood store connected"),
        Err(e) if e.is_fatal() => {
            tracing::error!(error = %e, "Could not connect to the mood store");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Mood store not reachable at startup; will retry on first request");
        }
    }

    let state = AppState::new(
        store,
        Duration::from_secs(config.data_cache_ttl_secs),
        config.submit_rate_limit,
        config.submit_rate_window_secs,
    );
    state.rate_limiter.spawn_cleanup_worker();

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = Vec::new();
        if let Ok(hv) = config.frontend_url.parse::<axum::http::HeaderValue>() {
            origins.push(hv);
        }
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    let app = routes::build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    // Client IP is needed for submission rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
