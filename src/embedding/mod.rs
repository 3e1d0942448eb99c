//! Embedding generation and validation.
//!
//! Providers return either a single vector or a collection depending on how
//! many inputs were submitted. [`RawEmbeddings`] captures both shapes and the
//! validator in [`validate`] normalizes them before anything is attached to a
//! retrieval unit.

mod cached;
mod gemini;
mod openai;
pub mod validate;

pub use cached::QueryEmbedder;
pub use gemini::GeminiEmbedder;
pub use openai::OpenAIEmbedder;
pub use validate::{attach, validate_vectors, BatchError};

use crate::config::EmbeddingSettings;
use crate::error::{Result, VidlensError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Embedding intent. Query and document embeddings of the same text differ
/// and must never share a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Query,
    Document,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Query => "retrieval_query",
            TaskType::Document => "retrieval_document",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "query" | "retrieval_query" => Ok(TaskType::Query),
            "document" | "retrieval_document" => Ok(TaskType::Document),
            _ => Err(format!("Unknown task type: {}", s)),
        }
    }
}

/// Response of a batch embedding call before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEmbeddings {
    /// The provider returned one bare vector.
    Single(Vec<f32>),
    /// The provider returned an ordered collection.
    Batch(Vec<Vec<f32>>),
}

impl RawEmbeddings {
    /// Normalize to an ordered sequence of vectors.
    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            RawEmbeddings::Single(v) => vec![v],
            RawEmbeddings::Batch(vs) => vs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawEmbeddings::Single(_) => 1,
            RawEmbeddings::Batch(vs) => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts` in order. Providers may return fewer vectors than inputs;
    /// callers must validate the result.
    async fn embed_batch(&self, texts: &[String], task: TaskType) -> Result<RawEmbeddings>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Create the embedder selected in the configuration.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider.to_lowercase().as_str() {
        "gemini" | "google" => Ok(Arc::new(GeminiEmbedder::from_env(
            &settings.model,
            settings.batch_size,
        )?)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::with_config(
            &settings.model,
            settings.dimensions as usize,
            settings.batch_size,
        )?)),
        other => Err(VidlensError::Config(format!(
            "Unknown embedding provider: {}",
            other
        ))),
    }
}
