//! Video store abstraction.
//!
//! A [`VideoRecord`] is published as a whole: readers see either the previous
//! record or the new one, never a mix of the two.

mod memory;
mod sqlite;

pub use memory::MemoryVideoStore;
pub use sqlite::SqliteVideoStore;

use crate::config::Settings;
use crate::error::{Result, VidlensError};
use crate::transcript::{GeneratedSection, TranscriptEntry};
use crate::unit::RetrievalUnit;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a video's retrieval units were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Chunked from captions.
    Transcript,
    /// One unit per model-generated section.
    VideoAnalysis,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Transcript => "transcript",
            ProcessingMode::VideoAnalysis => "video_analysis",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "transcript" => Ok(ProcessingMode::Transcript),
            "video_analysis" => Ok(ProcessingMode::VideoAnalysis),
            _ => Err(format!("Unknown processing mode: {}", s)),
        }
    }
}

/// Everything known about a processed video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub video_id: String,
    pub youtube_url: String,
    pub processing_mode: ProcessingMode,
    pub transcript: Option<Vec<TranscriptEntry>>,
    pub sections: Vec<GeneratedSection>,
    /// Text chunks in order.
    pub chunks: Vec<RetrievalUnit>,
    /// Described frames in timestamp order. Empty without a visual index.
    pub frames: Vec<RetrievalUnit>,
    pub processed_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn transcript_length(&self) -> usize {
        self.transcript.as_ref().map_or(0, Vec::len)
    }

    pub fn has_visual_index(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn summary(&self) -> VideoSummary {
        VideoSummary {
            video_id: self.video_id.clone(),
            youtube_url: self.youtube_url.clone(),
            processing_mode: self.processing_mode,
            section_count: self.sections.len(),
            chunk_count: self.chunks.len(),
            frame_count: self.frames.len(),
            processed_at: self.processed_at,
        }
    }
}

/// Summary information about a processed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub youtube_url: String,
    pub processing_mode: ProcessingMode,
    pub section_count: usize,
    pub chunk_count: usize,
    pub frame_count: usize,
    pub processed_at: DateTime<Utc>,
}

/// Trait for video store implementations.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Store a record, replacing any previous record for the same video.
    async fn publish(&self, record: VideoRecord) -> Result<()>;

    async fn get(&self, video_id: &str) -> Result<Option<Arc<VideoRecord>>>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, video_id: &str) -> Result<bool>;

    /// Summaries of all records, most recently processed first.
    async fn list(&self) -> Result<Vec<VideoSummary>>;
}

/// Create the store selected in the configuration.
pub fn create_store(settings: &Settings) -> Result<Arc<dyn VideoStore>> {
    match settings.store.provider.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteVideoStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVideoStore::new())),
        other => Err(VidlensError::Config(format!(
            "Unknown store provider: {}",
            other
        ))),
    }
}

/// Serialize embedding to little-endian bytes.
pub(crate) fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from little-endian bytes.
pub(crate) fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::chunking::ContentChunk;
    use crate::unit::PendingUnit;

    /// A small record with two chunks and one frame.
    pub fn record(video_id: &str) -> VideoRecord {
        let chunks = vec![
            RetrievalUnit::embedded(
                0,
                ContentChunk::new("intro text".into(), 0.0, 30.0).into(),
                vec![1.0, 0.0],
            ),
            RetrievalUnit::embedded(
                1,
                ContentChunk::new("main text".into(), 30.0, 60.0).into(),
                vec![0.0, 1.0],
            ),
        ];
        let frames = vec![RetrievalUnit::embedded(
            0,
            PendingUnit::frame("a slide with a chart".into(), 10.0, 20.0, "/9j/AA==".into()),
            vec![0.5, 0.5],
        )];

        VideoRecord {
            video_id: video_id.to_string(),
            youtube_url: format!("https://www.youtube.com/watch?v={}", video_id),
            processing_mode: ProcessingMode::Transcript,
            transcript: Some(vec![TranscriptEntry::new("intro text", 0.0, 3.0)]),
            sections: vec![GeneratedSection {
                title: "Intro".into(),
                start_time: 0.0,
                end_time: 60.0,
                summary: "Everything".into(),
            }],
            chunks,
            frames,
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25, -1.5, f32::MAX, 0.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&embedding)), embedding);
    }

    #[test]
    fn test_processing_mode_strings() {
        assert_eq!(ProcessingMode::VideoAnalysis.as_str(), "video_analysis");
        assert_eq!(
            "transcript".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::Transcript
        );
        assert_eq!(
            serde_json::to_value(ProcessingMode::VideoAnalysis).unwrap(),
            "video_analysis"
        );
    }

    #[test]
    fn test_summary() {
        let record = test_support::record("abc");
        let summary = record.summary();
        assert_eq!(summary.chunk_count, 2);
        assert_eq!(summary.frame_count, 1);
        assert_eq!(summary.section_count, 1);
        assert!(record.has_visual_index());
        assert_eq!(record.transcript_length(), 1);
    }
}
