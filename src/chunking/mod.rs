//! Transcript chunking.
//!
//! Folds time-ordered caption entries into contiguous chunks bounded by a
//! maximum duration. Videos without a transcript get one chunk per generated
//! section instead.

use crate::error::{Result, VidlensError};
use crate::transcript::{GeneratedSection, TranscriptEntry};
use serde::{Deserialize, Serialize};

/// Duration assumed for entries that omit one.
pub const DEFAULT_ENTRY_DURATION: f64 = 3.0;

/// A time-bounded span of text, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
}

impl ContentChunk {
    pub fn new(text: String, start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            text,
            start_seconds,
            end_seconds,
        }
    }

    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Duration-bounded transcript chunker.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptChunker {
    max_chunk_seconds: f64,
    default_duration: f64,
}

impl TranscriptChunker {
    /// Create a chunker. `max_chunk_seconds` must be a positive number.
    pub fn new(max_chunk_seconds: f64) -> Result<Self> {
        if !max_chunk_seconds.is_finite() || max_chunk_seconds <= 0.0 {
            return Err(VidlensError::Config(format!(
                "max_chunk_seconds must be positive, got {}",
                max_chunk_seconds
            )));
        }

        Ok(Self {
            max_chunk_seconds,
            default_duration: DEFAULT_ENTRY_DURATION,
        })
    }

    /// Override the duration used for entries that omit one.
    pub fn with_default_duration(mut self, seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(VidlensError::Config(format!(
                "default entry duration must be non-negative, got {}",
                seconds
            )));
        }
        self.default_duration = seconds;
        Ok(self)
    }

    pub fn max_chunk_seconds(&self) -> f64 {
        self.max_chunk_seconds
    }

    /// Split `entries` into chunks.
    ///
    /// A chunk closes when the next entry would start at or beyond
    /// `chunk_start + max_chunk_seconds`, or at the last entry. Its end is the
    /// closing entry's start plus duration; the next chunk starts at the
    /// following entry's start.
    pub fn chunk(&self, entries: &[TranscriptEntry]) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();
        let Some(first) = entries.first() else {
            return chunks;
        };

        let mut chunk_start = first.start;
        let mut texts: Vec<&str> = Vec::new();

        for (i, entry) in entries.iter().enumerate() {
            let text = entry.text.trim();
            if !text.is_empty() {
                texts.push(text);
            }

            let next = entries.get(i + 1);
            let closes = match next {
                None => true,
                Some(next) => next.start - chunk_start >= self.max_chunk_seconds,
            };

            if closes {
                let duration = entry.duration.unwrap_or(self.default_duration);
                chunks.push(ContentChunk::new(
                    texts.join(" "),
                    chunk_start,
                    entry.start + duration,
                ));
                texts.clear();
                if let Some(next) = next {
                    chunk_start = next.start;
                }
            }
        }

        chunks
    }
}

/// One chunk per generated section, for videos without a transcript.
pub fn section_chunks(sections: &[GeneratedSection]) -> Vec<ContentChunk> {
    sections
        .iter()
        .map(|s| {
            let text = if s.summary.trim().is_empty() {
                s.title.clone()
            } else {
                format!("{}: {}", s.title, s.summary)
            };
            let start = s.start_time.max(0.0);
            ContentChunk::new(text, start, s.end_time.max(start))
        })
        .collect()
}
