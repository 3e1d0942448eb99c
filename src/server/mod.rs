//! HTTP API for processing videos and querying them.
//!
//! Expensive and destructive endpoints (processing, chat, visual search,
//! cache clearing) sit behind the per-client rate limiter. Every request runs in a span carrying a request id.

mod dto;
mod error;
mod extract;
mod handlers;
mod state;

pub use error::ApiError;
pub use state::AppState;

use crate::config::ServerSettings;
use crate::error::{Result, VidlensError};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Result<Router> {
    let cors = cors_layer(&state.orchestrator.settings().server)?;

    let limited = Router::new()
        .route("/process_video", post(handlers::process_video))
        .route("/chat", post(handlers::chat))
        .route("/visual_search", post(handlers::visual_search))
        .route("/cache/clear", post(handlers::cache_clear))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::rate_limit,
        ));

    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/video/{video_id}",
            get(handlers::get_video).delete(handlers::delete_video),
        )
        .route("/videos", get(handlers::list_videos))
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/rate_limit/{client_id}", get(handlers::rate_limit_usage))
        .merge(limited)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .with_state(state);

    Ok(app)
}

/// Allow the configured origins, or any origin when none are configured.
fn cors_layer(settings: &ServerSettings) -> Result<CorsLayer> {
    if settings.cors_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = settings
        .cors_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                VidlensError::Config(format!("Invalid CORS origin: {}", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state)?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
