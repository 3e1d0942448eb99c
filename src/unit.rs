//! Retrieval units: the chunks and frames that queries are ranked against.
//!
//! A [`RetrievalUnit`] always carries a non-empty embedding. The only ways to
//! obtain one are the batch validator ([`crate::embedding::attach`]) and the
//! store loaders, both of which reject empty vectors, so the ranker never sees
//! a partially-initialized unit.

use crate::chunking::ContentChunk;
use crate::embedding::BatchError;
use serde::{Deserialize, Serialize};

/// Whether a unit came from transcript text or from a described video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Chunk,
    Frame,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Chunk => "chunk",
            UnitKind::Frame => "frame",
        }
    }
}

/// A unit waiting for its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUnit {
    pub kind: UnitKind,
    /// Chunk text, or the generated description of a frame.
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Base64 image payload, frames only.
    pub image_base64: Option<String>,
}

impl PendingUnit {
    /// A visual frame with its generated description.
    pub fn frame(description: String, timestamp: f64, end_timestamp: f64, image_base64: String) -> Self {
        Self {
            kind: UnitKind::Frame,
            text: description,
            start_seconds: timestamp,
            end_seconds: end_timestamp.max(timestamp),
            image_base64: Some(image_base64),
        }
    }
}

impl From<ContentChunk> for PendingUnit {
    fn from(chunk: ContentChunk) -> Self {
        Self {
            kind: UnitKind::Chunk,
            text: chunk.text,
            start_seconds: chunk.start_seconds,
            end_seconds: chunk.end_seconds,
            image_base64: None,
        }
    }
}

/// A fully embedded chunk or frame. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalUnit {
    order: usize,
    kind: UnitKind,
    text: String,
    start_seconds: f64,
    end_seconds: f64,
    #[serde(skip)]
    embedding: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_base64: Option<String>,
}

impl RetrievalUnit {
    /// Callers must guarantee `embedding` is non-empty.
    pub(crate) fn embedded(order: usize, pending: PendingUnit, embedding: Vec<f32>) -> Self {
        debug_assert!(!embedding.is_empty());
        Self {
            order,
            kind: pending.kind,
            text: pending.text,
            start_seconds: pending.start_seconds,
            end_seconds: pending.end_seconds,
            embedding,
            image_base64: pending.image_base64,
        }
    }

    /// Rebuild a unit loaded from storage. Rows with an empty embedding are
    /// rejected.
    pub(crate) fn restore(
        order: usize,
        pending: PendingUnit,
        embedding: Vec<f32>,
    ) -> Result<Self, BatchError> {
        if embedding.is_empty() {
            return Err(BatchError::EmptyVector { index: order });
        }
        Ok(Self::embedded(order, pending, embedding))
    }

    /// Position in the owning video's sequence.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_seconds
    }

    pub fn end_seconds(&self) -> f64 {
        self.end_seconds
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn image_base64(&self) -> Option<&str> {
        self.image_base64.as_deref()
    }

    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}
