use crate::cache::CacheStats;
use crate::rate_limit::RateUsage;
use crate::store::{ProcessingMode, VideoRecord, VideoSummary};
use crate::transcript::GeneratedSection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// === Requests ===

#[derive(Debug, Deserialize)]
pub struct ProcessVideoRequest {
    pub youtube_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub video_id: String,
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct VisualSearchRequest {
    pub video_id: String,
    pub query: String,
    #[serde(default = "default_include_narrative")]
    pub include_narrative: bool,
}

fn default_include_narrative() -> bool {
    true
}

// === Responses ===

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub route: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub rate_limiting: bool,
}

#[derive(Serialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub youtube_url: String,
    pub processing_mode: ProcessingMode,
    pub sections: Vec<GeneratedSection>,
    pub transcript_length: usize,
    pub chunk_count: usize,
    pub frame_count: usize,
    pub processed_at: DateTime<Utc>,
}

impl From<&VideoRecord> for VideoInfo {
    fn from(record: &VideoRecord) -> Self {
        Self {
            video_id: record.video_id.clone(),
            youtube_url: record.youtube_url.clone(),
            processing_mode: record.processing_mode,
            sections: record.sections.clone(),
            transcript_length: record.transcript_length(),
            chunk_count: record.chunks.len(),
            frame_count: record.frames.len(),
            processed_at: record.processed_at,
        }
    }
}

#[derive(Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoSummary>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub video_id: String,
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
}

#[derive(Serialize)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

#[derive(Serialize)]
pub struct RateLimitResponse {
    pub client_id: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<RateUsage>,
}
