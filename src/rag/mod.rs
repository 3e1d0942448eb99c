//! Question answering and visual search over a processed video.

pub mod context;
mod response;

pub use context::ContextBuilder;
pub use response::RagEngine;

use crate::ranking::{Confidence, Ranked};
use crate::transcript::format_timestamp;
use crate::unit::{RetrievalUnit, UnitKind};
use crate::validation::watch_url;
use serde::Serialize;

/// Characters of chunk text kept in a citation preview.
const PREVIEW_CHARS: usize = 100;

/// A ranked unit with display fields.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Formatted timestamp (e.g., "02:34").
    pub timestamp: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub kind: UnitKind,
    /// Chunk text or frame description.
    pub content: String,
    /// Similarity score.
    pub score: f32,
    /// Watch URL starting at this unit.
    pub url: String,
}

impl ContextChunk {
    pub fn from_ranked(video_id: &str, ranked: &Ranked<'_, RetrievalUnit>) -> Self {
        let unit = ranked.item;
        Self {
            timestamp: format_timestamp(unit.start_seconds()),
            start_seconds: unit.start_seconds(),
            end_seconds: unit.end_seconds(),
            kind: unit.kind(),
            content: unit.text().to_string(),
            score: ranked.score,
            url: format!("{}&t={}s", watch_url(video_id), unit.start_seconds() as u64),
        }
    }

    pub fn confidence(&self) -> Confidence {
        Confidence::from_score(self.score)
    }
}

/// A cited moment in an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevantTimestamp {
    pub timestamp: f64,
    pub end_timestamp: f64,
    /// Preview of the cited text.
    pub text: String,
}

impl From<&ContextChunk> for RelevantTimestamp {
    fn from(chunk: &ContextChunk) -> Self {
        Self {
            timestamp: chunk.start_seconds,
            end_timestamp: chunk.end_seconds,
            text: preview(&chunk.content),
        }
    }
}

/// Answer to a question about a video.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub relevant_timestamps: Vec<RelevantTimestamp>,
    pub sources_count: usize,
}

/// One visual search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualMatch {
    pub timestamp: f64,
    pub end_timestamp: f64,
    pub description: String,
    pub confidence: Confidence,
    pub score: f32,
    /// Whether the hit is a described frame or a transcript chunk.
    pub source: UnitKind,
}

impl From<&ContextChunk> for VisualMatch {
    fn from(chunk: &ContextChunk) -> Self {
        Self {
            timestamp: chunk.start_seconds,
            end_timestamp: chunk.end_seconds,
            description: chunk.content.clone(),
            confidence: chunk.confidence(),
            score: chunk.score,
            source: chunk.kind,
        }
    }
}

/// Result of a visual search.
#[derive(Debug, Clone, Serialize)]
pub struct VisualSearchResult {
    pub query: String,
    pub matches: Vec<VisualMatch>,
    pub total_matches: usize,
    /// False when the video has no frame index and chunks were searched instead.
    pub visual_index: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
