//! Answer generation and visual search.

use super::context::format_context_for_prompt;
use super::{Answer, ContextBuilder, RelevantTimestamp, VisualMatch, VisualSearchResult};
use crate::config::Prompts;
use crate::embedding::QueryEmbedder;
use crate::error::{Result, VidlensError};
use crate::generation::Generator;
use crate::store::{VideoRecord, VideoStore};
use crate::validation::{validate_question, validate_video_id};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Answers questions and runs visual searches against stored videos.
pub struct RagEngine {
    store: Arc<dyn VideoStore>,
    generator: Arc<dyn Generator>,
    context_builder: ContextBuilder,
    prompts: Prompts,
    visual_top_k: usize,
    max_question_chars: usize,
}

impl RagEngine {
    pub fn new(
        store: Arc<dyn VideoStore>,
        embedder: QueryEmbedder,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            store,
            generator,
            context_builder: ContextBuilder::new(embedder),
            prompts: Prompts::default(),
            visual_top_k: 5,
            max_question_chars: 2000,
        }
    }

    /// Set retrieval limits.
    pub fn with_limits(mut self, top_k: usize, visual_top_k: usize, max_question_chars: usize) -> Self {
        self.context_builder = self.context_builder.with_max_chunks(top_k);
        self.visual_top_k = visual_top_k;
        self.max_question_chars = max_question_chars;
        self
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn query_embedder(&self) -> &QueryEmbedder {
        self.context_builder.embedder()
    }

    async fn record(&self, video_id: &str) -> Result<Arc<VideoRecord>> {
        validate_video_id(video_id)?;
        self.store
            .get(video_id)
            .await?
            .ok_or_else(|| VidlensError::VideoNotFound(video_id.to_string()))
    }

    /// Answer a question about a processed video, citing `[MM:SS]` moments.
    #[instrument(skip(self, question), fields(video_id = %video_id))]
    pub async fn ask(&self, video_id: &str, question: &str) -> Result<Answer> {
        let question = validate_question(question, self.max_question_chars)?;
        let record = self.record(video_id).await?;

        let context = self
            .context_builder
            .build(video_id, question, &record.chunks)
            .await?;

        // Nothing rankable: no chunks, or none comparable with the query.
        if context.is_empty() {
            return Ok(Answer {
                answer: self.prompts.chat.no_content.clone(),
                relevant_timestamps: Vec::new(),
                sources_count: 0,
            });
        }

        let prompt = self.prompts.render_with_custom(
            &self.prompts.chat.answer,
            &[
                ("context", format_context_for_prompt(&context)),
                ("question", question.to_string()),
            ],
        );

        let answer = self.generator.generate(&prompt).await?;
        info!(sources = context.len(), "Answered question");

        Ok(Answer {
            answer,
            relevant_timestamps: context.iter().map(RelevantTimestamp::from).collect(),
            sources_count: context.len(),
        })
    }

    /// Find moments matching a visual description.
    ///
    /// Searches described frames when the video has a visual index, otherwise
    /// transcript chunks. A failed narrative never discards the matches.
    #[instrument(skip(self, query), fields(video_id = %video_id))]
    pub async fn visual_search(
        &self,
        video_id: &str,
        query: &str,
        include_narrative: bool,
    ) -> Result<VisualSearchResult> {
        let query = validate_question(query, self.max_question_chars)?;
        let record = self.record(video_id).await?;

        let visual_index = record.has_visual_index();
        let units = if visual_index {
            &record.frames
        } else {
            &record.chunks
        };

        let context = self
            .context_builder
            .build_with_limit(video_id, query, units, self.visual_top_k)
            .await?;
        let matches: Vec<VisualMatch> = context.iter().map(VisualMatch::from).collect();

        let narrative = if include_narrative && !matches.is_empty() {
            let prompt = self.prompts.render_with_custom(
                &self.prompts.visual.narrative,
                &[
                    ("query", query.to_string()),
                    ("matches", format_context_for_prompt(&context)),
                ],
            );
            match self.generator.generate(&prompt).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Visual narrative failed, returning matches only: {}", e);
                    None
                }
            }
        } else {
            None
        };

        info!(matches = matches.len(), visual_index, "Visual search complete");

        Ok(VisualSearchResult {
            query: query.to_string(),
            total_matches: matches.len(),
            matches,
            visual_index,
            narrative,
        })
    }
}
