//! Gemini embeddings implementation.

use super::{Embedder, RawEmbeddings, TaskType};
use crate::error::{Result, VidlensError};
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

fn task_name(task: TaskType) -> &'static str {
    match task {
        TaskType::Query => "RETRIEVAL_QUERY",
        TaskType::Document => "RETRIEVAL_DOCUMENT",
    }
}

/// Gemini-based embedder.
///
/// One text goes through `embedContent` and comes back as a bare vector;
/// anything else goes through `batchEmbedContents`.
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
    batch_size: usize,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient, model: &str, batch_size: usize) -> Self {
        Self {
            client,
            model: GeminiClient::model_name(model),
            batch_size: batch_size.max(1),
        }
    }

    /// Create an embedder with the API key from the environment.
    pub fn from_env(model: &str, batch_size: usize) -> Result<Self> {
        Ok(Self::new(GeminiClient::from_env()?, model, batch_size))
    }

    fn request<'a>(&'a self, text: &'a str, task: TaskType) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
            task_type: task_name(task),
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len(), task = task.as_str()))]
    async fn embed_batch(&self, texts: &[String], task: TaskType) -> Result<RawEmbeddings> {
        if let [text] = texts {
            let response: EmbedResponse = self
                .client
                .call(&self.model, "embedContent", &self.request(text, task))
                .await
                .map_err(|e| VidlensError::Embedding(e.to_string()))?;
            return Ok(RawEmbeddings::Single(response.embedding.values));
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let body = BatchEmbedRequest {
                requests: chunk.iter().map(|t| self.request(t, task)).collect(),
            };

            let response: BatchEmbedResponse = self
                .client
                .call(&self.model, "batchEmbedContents", &body)
                .await
                .map_err(|e| VidlensError::Embedding(e.to_string()))?;

            all_embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(RawEmbeddings::Batch(all_embeddings))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
