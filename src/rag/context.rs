//! Context building for answers and visual search.

use super::ContextChunk;
use crate::error::Result;
use crate::ranking::rank;
use crate::embedding::QueryEmbedder;
use crate::unit::RetrievalUnit;
use tracing::{debug, warn};

/// Embeds a query and ranks a video's units against it.
#[derive(Clone)]
pub struct ContextBuilder {
    embedder: QueryEmbedder,
    max_chunks: usize,
}

impl ContextBuilder {
    pub fn new(embedder: QueryEmbedder) -> Self {
        Self {
            embedder,
            max_chunks: 5,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn embedder(&self) -> &QueryEmbedder {
        &self.embedder
    }

    /// Rank `units` against `query` and return at most `limit` of them.
    pub async fn build_with_limit(
        &self,
        video_id: &str,
        query: &str,
        units: &[RetrievalUnit],
        limit: usize,
    ) -> Result<Vec<ContextChunk>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let ranked = rank(&query_embedding, units, limit);
        debug!(candidates = units.len(), selected = ranked.len(), "Ranked units");
        if ranked.is_empty() && units[0].dimensions() != query_embedding.len() {
            warn!(
                stored = units[0].dimensions(),
                query = query_embedding.len(),
                "Query embedding dimensions differ from stored units; reprocess the video"
            );
        }

        Ok(ranked
            .iter()
            .map(|r| ContextChunk::from_ranked(video_id, r))
            .collect())
    }

    /// Rank `units` against `query` using the configured limit.
    pub async fn build(
        &self,
        video_id: &str,
        query: &str,
        units: &[RetrievalUnit],
    ) -> Result<Vec<ContextChunk>> {
        self.build_with_limit(video_id, query, units, self.max_chunks)
            .await
    }
}

/// Format context chunks as `[MM:SS] text` paragraphs for a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[{}] {}", chunk.timestamp, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitKind;

    fn chunk(timestamp: &str, content: &str, score: f32) -> ContextChunk {
        ContextChunk {
            timestamp: timestamp.to_string(),
            start_seconds: 0.0,
            end_seconds: 0.0,
            kind: UnitKind::Chunk,
            content: content.to_string(),
            score,
            url: "https://www.youtube.com/watch?v=abc&t=0s".to_string(),
        }
    }

    #[test]
    fn test_format_for_prompt() {
        let chunks = vec![chunk("00:00", "first", 0.9), chunk("01:30", "second", 0.5)];
        assert_eq!(format_context_for_prompt(&chunks), "[00:00] first\n\n[01:30] second");
    }
}
