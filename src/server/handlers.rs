use axum::{
    extract::{ConnectInfo, Path, Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::dto::*;
use super::error::ApiError;
use super::extract::ApiJson;
use super::state::AppState;
use crate::cache::VectorCache;
use crate::orchestrator::ProcessResult;
use crate::rag::{Answer, VisualSearchResult};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Client identity for rate limiting: the peer IP, or "unknown" when the
/// server was not started with connection info.
pub fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reject requests from clients over their limit before the handler runs.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter {
        let client = client_id(&request);
        if let Err(e) = limiter.check(&client) {
            tracing::warn!(client = %client, scope = %e.scope, "Rate limit exceeded");
            return Err(e.into());
        }
    }
    Ok(next.run(request).await)
}

/// GET / - Service info
pub async fn root() -> Json<ServiceInfo> {
    let endpoints = [
        ("POST /process_video", "Process a YouTube video and index its content"),
        ("POST /chat", "Ask a question about a processed video"),
        ("POST /visual_search", "Find moments matching a visual description"),
        ("GET /video/{video_id}", "Information about a processed video"),
        ("DELETE /video/{video_id}", "Delete a processed video"),
        ("GET /videos", "List processed videos"),
        ("GET /cache/stats", "Query embedding cache statistics"),
        ("POST /cache/clear", "Clear the query embedding cache"),
        ("GET /rate_limit/{client_id}", "Rate limit usage for a client"),
    ];

    Json(ServiceInfo {
        message: "vidlens video knowledge base API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: endpoints
            .into_iter()
            .map(|(route, description)| EndpointInfo { route, description })
            .collect(),
    })
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        rate_limiting: state.limiter.is_some(),
    })
}

/// POST /process_video
pub async fn process_video(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ProcessVideoRequest>,
) -> ApiResult<ProcessResult> {
    let result = state.orchestrator.process_video(&req.youtube_url).await?;
    Ok(Json(result))
}

/// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> ApiResult<Answer> {
    let answer = state.orchestrator.ask(&req.video_id, &req.question).await?;
    Ok(Json(answer))
}

/// POST /visual_search
pub async fn visual_search(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VisualSearchRequest>,
) -> ApiResult<VisualSearchResult> {
    let result = state
        .orchestrator
        .visual_search(&req.video_id, &req.query, req.include_narrative)
        .await?;
    Ok(Json(result))
}

/// GET /video/{video_id}
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> ApiResult<VideoInfo> {
    let record = state.orchestrator.get_video(&video_id).await?;
    Ok(Json(VideoInfo::from(record.as_ref())))
}

/// DELETE /video/{video_id}
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> ApiResult<DeleteResponse> {
    state.orchestrator.delete_video(&video_id).await?;
    Ok(Json(DeleteResponse {
        video_id,
        deleted: true,
    }))
}

/// GET /videos
pub async fn list_videos(State(state): State<Arc<AppState>>) -> ApiResult<VideoListResponse> {
    let videos = state.orchestrator.list_videos().await?;
    let total = videos.len();
    Ok(Json(VideoListResponse { videos, total }))
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        stats: state.orchestrator.cache().stats(),
    })
}

/// POST /cache/clear
pub async fn cache_clear(State(state): State<Arc<AppState>>) -> Json<CacheClearResponse> {
    let cache = state.orchestrator.cache();
    let cleared = cache.stats().size;
    cache.clear();
    tracing::info!(cleared, "Cleared query embedding cache");
    Json(CacheClearResponse { cleared })
}

/// GET /rate_limit/{client_id}
pub async fn rate_limit_usage(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Json<RateLimitResponse> {
    Json(RateLimitResponse {
        usage: state.limiter.as_ref().map(|l| l.usage(&client_id)),
        enabled: state.limiter.is_some(),
        client_id,
    })
}
