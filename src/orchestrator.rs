//! Pipeline orchestrator for vidlens.
//!
//! Coordinates processing from caption download to a published video record,
//! and routes questions and visual searches to the RAG engine.

use crate::cache::{EmbeddingCache, PersistentEmbeddingCache, VectorCache};
use crate::chunking::{section_chunks, ContentChunk, TranscriptChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{attach, create_embedder, Embedder, QueryEmbedder, TaskType};
use crate::error::{Result, VidlensError};
use crate::generation::{create_generator, Generator, InlineImage};
use crate::media::{FfmpegFrameSource, FrameCapture, FrameSettings, FrameSource};
use crate::rag::{Answer, RagEngine, VisualSearchResult};
use crate::store::{create_store, ProcessingMode, VideoRecord, VideoStore, VideoSummary};
use crate::transcript::{
    format_timestamp, format_transcript, parse_json_response, GeneratedSection, SectionBreakdown,
    TranscriptEntry, TranscriptSource, YtDlpTranscriptSource,
};
use crate::unit::{PendingUnit, RetrievalUnit};
use crate::validation::{extract_video_id, validate_video_id, watch_url};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// External collaborators used by the orchestrator.
pub struct Components {
    pub transcripts: Arc<dyn TranscriptSource>,
    /// Present when visual indexing is enabled.
    pub frames: Option<Arc<dyn FrameSource>>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
    pub store: Arc<dyn VideoStore>,
    pub cache: Arc<dyn VectorCache>,
}

/// The main orchestrator for the vidlens pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    chunker: TranscriptChunker,
    transcripts: Arc<dyn TranscriptSource>,
    frames: Option<Arc<dyn FrameSource>>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    store: Arc<dyn VideoStore>,
    rag: RagEngine,
}

impl Orchestrator {
    /// Create an orchestrator with the providers named in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let frames: Option<Arc<dyn FrameSource>> = if settings.visual.enabled {
            info!(
                interval = settings.visual.frame_interval_seconds,
                "Visual indexing enabled"
            );
            Some(Arc::new(FfmpegFrameSource::new(
                temp_dir.join("frames"),
                FrameSettings {
                    interval_seconds: settings.visual.frame_interval_seconds,
                    max_frames: settings.visual.max_frames,
                },
            )?))
        } else {
            None
        };

        let components = Components {
            transcripts: Arc::new(YtDlpTranscriptSource::new(temp_dir.join("captions"))),
            frames,
            embedder: create_embedder(&settings.embedding)?,
            generator: create_generator(&settings.generation)?,
            store: create_store(&settings)?,
            cache: create_cache(&settings)?,
        };

        Self::with_components(settings, prompts, components)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        components: Components,
    ) -> Result<Self> {
        let chunker = TranscriptChunker::new(settings.chunking.max_chunk_seconds)?
            .with_default_duration(settings.chunking.default_entry_duration)?;

        let query_embedder = QueryEmbedder::new(components.embedder.clone(), components.cache);
        let rag = RagEngine::new(
            components.store.clone(),
            query_embedder,
            components.generator.clone(),
        )
        .with_limits(
            settings.rag.top_k,
            settings.rag.visual_top_k,
            settings.rag.max_question_chars,
        )
        .with_prompts(prompts.clone());

        Ok(Self {
            settings,
            prompts,
            chunker,
            transcripts: components.transcripts,
            frames: components.frames,
            embedder: components.embedder,
            generator: components.generator,
            store: components.store,
            rag,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the video store.
    pub fn store(&self) -> Arc<dyn VideoStore> {
        self.store.clone()
    }

    /// Get a reference to the query embedding cache.
    pub fn cache(&self) -> Arc<dyn VectorCache> {
        self.rag.query_embedder().cache().clone()
    }

    pub fn rag(&self) -> &RagEngine {
        &self.rag
    }

    /// Process a video: fetch captions, build sections, chunk, embed and publish.
    ///
    /// Nothing is published unless every batch validates.
    #[instrument(skip(self), fields(url = %youtube_url))]
    pub async fn process_video(&self, youtube_url: &str) -> Result<ProcessResult> {
        let video_id = extract_video_id(youtube_url)?;
        info!(video_id = %video_id, "Processing video");

        let transcript = self
            .transcripts
            .fetch(&video_id)
            .await?
            .filter(|entries| !entries.is_empty());

        let (processing_mode, sections, chunks) = match &transcript {
            Some(entries) => {
                info!(entries = entries.len(), "Using captions");
                let sections = self.transcript_sections(entries).await;
                (ProcessingMode::Transcript, sections, self.chunker.chunk(entries))
            }
            None => {
                info!("No captions available, analyzing video directly");
                let sections = self.analyze_video(&video_id).await?;
                let chunks = section_chunks(&sections);
                (ProcessingMode::VideoAnalysis, sections, chunks)
            }
        };

        let chunks = self.embed_chunks(chunks).await?;
        info!(chunks = chunks.len(), "Embedded chunks");

        let frames = match &self.frames {
            Some(source) => self.index_frames(source.as_ref(), &video_id).await?,
            None => Vec::new(),
        };

        let result = ProcessResult {
            video_id: video_id.clone(),
            youtube_url: watch_url(&video_id),
            processing_mode,
            transcript_length: transcript.as_ref().map_or(0, Vec::len),
            sections: sections.clone(),
            chunks_created: chunks.len(),
            frames_indexed: frames.len(),
        };

        self.store
            .publish(VideoRecord {
                youtube_url: result.youtube_url.clone(),
                video_id,
                processing_mode,
                transcript,
                sections,
                chunks,
                frames,
                processed_at: Utc::now(),
            })
            .await?;

        info!(
            chunks = result.chunks_created,
            frames = result.frames_indexed,
            mode = %result.processing_mode,
            "Published video"
        );
        Ok(result)
    }

    /// Ask the generator for a section breakdown of a transcript.
    ///
    /// Sections are informational in this mode, so a failure leaves them empty.
    async fn transcript_sections(&self, entries: &[TranscriptEntry]) -> Vec<GeneratedSection> {
        let prompt = self.prompts.render_with_custom(
            &self.prompts.sections.transcript,
            &[("transcript", format_transcript(entries))],
        );

        let breakdown = match self.generator.generate(&prompt).await {
            Ok(text) => parse_json_response::<SectionBreakdown>(&text),
            Err(e) => Err(e),
        };

        match breakdown {
            Ok(breakdown) => breakdown.sections,
            Err(e) => {
                warn!("Section breakdown failed, continuing without sections: {}", e);
                Vec::new()
            }
        }
    }

    /// Have the generator watch the video and return its sections.
    async fn analyze_video(&self, video_id: &str) -> Result<Vec<GeneratedSection>> {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.sections.video_analysis, &[]);
        let text = self
            .generator
            .analyze_video(&prompt, &watch_url(video_id))
            .await?;

        let breakdown: SectionBreakdown = parse_json_response(&text)?;
        if breakdown.sections.is_empty() {
            return Err(VidlensError::TranscriptUnavailable(format!(
                "no captions and video analysis returned no sections for {}",
                video_id
            )));
        }
        Ok(breakdown.sections)
    }

    async fn embed_chunks(&self, chunks: Vec<ContentChunk>) -> Result<Vec<RetrievalUnit>> {
        let pending: Vec<PendingUnit> = chunks.into_iter().map(PendingUnit::from).collect();
        self.embed_units(pending).await
    }

    /// Embed units as documents in one batch and validate the response.
    async fn embed_units(&self, units: Vec<PendingUnit>) -> Result<Vec<RetrievalUnit>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
        let raw = self.embedder.embed_batch(&texts, TaskType::Document).await?;

        attach(units, raw).map_err(|e| {
            warn!(model = self.embedder.model(), "Rejected embedding batch: {}", e);
            VidlensError::from(e)
        })
    }

    /// Capture, describe and embed frames.
    ///
    /// Capture failures and failed descriptions drop frames from the index.
    /// A batch that fails validation fails the whole run.
    #[instrument(skip(self, source))]
    async fn index_frames(
        &self,
        source: &dyn FrameSource,
        video_id: &str,
    ) -> Result<Vec<RetrievalUnit>> {
        let captures = match source.extract(video_id).await {
            Ok(captures) => captures,
            Err(e) => {
                warn!("Frame extraction failed, continuing without visual index: {}", e);
                return Ok(Vec::new());
            }
        };
        info!(frames = captures.len(), "Describing frames");

        let max_concurrent = self.settings.visual.max_concurrent.max(1);
        let mut described: Vec<(usize, PendingUnit)> = stream::iter(captures.into_iter().enumerate())
            .map(|(idx, capture)| async move {
                let result = self.describe_frame(&capture).await;
                (idx, capture, result)
            })
            .buffer_unordered(max_concurrent)
            .filter_map(|(idx, capture, result)| async move {
                match result {
                    Ok(description) => Some((
                        idx,
                        PendingUnit::frame(
                            description,
                            capture.timestamp,
                            capture.end_timestamp,
                            capture.image_base64,
                        ),
                    )),
                    Err(e) => {
                        warn!(timestamp = capture.timestamp, "Frame description failed: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        described.sort_by_key(|(idx, _)| *idx);
        debug!(described = described.len(), "Frames described");

        let pending = described.into_iter().map(|(_, unit)| unit).collect();
        self.embed_units(pending).await
    }

    async fn describe_frame(&self, capture: &FrameCapture) -> Result<String> {
        let prompt = self.prompts.render_with_custom(
            &self.prompts.visual.frame_description,
            &[("timestamp", format_timestamp(capture.timestamp))],
        );
        let description = self
            .generator
            .describe_image(
                &prompt,
                InlineImage {
                    mime_type: &capture.mime_type,
                    data_base64: &capture.image_base64,
                },
            )
            .await?;

        let description = description.trim();
        if description.is_empty() {
            return Err(VidlensError::Generation("empty frame description".to_string()));
        }
        Ok(description.to_string())
    }

    /// Answer a question about a processed video.
    pub async fn ask(&self, video_id: &str, question: &str) -> Result<Answer> {
        self.rag.ask(video_id, question).await
    }

    /// Search a processed video for a visual description.
    pub async fn visual_search(
        &self,
        video_id: &str,
        query: &str,
        include_narrative: bool,
    ) -> Result<VisualSearchResult> {
        self.rag.visual_search(video_id, query, include_narrative).await
    }

    /// Fetch a processed video.
    pub async fn get_video(&self, video_id: &str) -> Result<Arc<VideoRecord>> {
        validate_video_id(video_id)?;
        self.store
            .get(video_id)
            .await?
            .ok_or_else(|| VidlensError::VideoNotFound(video_id.to_string()))
    }

    /// List processed videos, most recent first.
    pub async fn list_videos(&self) -> Result<Vec<VideoSummary>> {
        self.store.list().await
    }

    /// Delete a processed video and its retrieval units.
    pub async fn delete_video(&self, video_id: &str) -> Result<()> {
        validate_video_id(video_id)?;
        if self.store.delete(video_id).await? {
            info!(video_id = %video_id, "Deleted video");
            Ok(())
        } else {
            Err(VidlensError::VideoNotFound(video_id.to_string()))
        }
    }
}

/// Build the query embedding cache selected in the configuration.
pub fn create_cache(settings: &Settings) -> Result<Arc<dyn VectorCache>> {
    if settings.cache.persistent {
        let path = settings.cache_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Arc::new(PersistentEmbeddingCache::open(
            &path,
            settings.cache.capacity,
        )?))
    } else {
        Ok(Arc::new(EmbeddingCache::new(settings.cache.capacity)?))
    }
}

/// Result of processing a video.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessResult {
    pub video_id: String,
    pub youtube_url: String,
    pub processing_mode: ProcessingMode,
    /// Caption entries used, zero in video analysis mode.
    pub transcript_length: usize,
    pub sections: Vec<GeneratedSection>,
    /// Number of text chunks indexed.
    pub chunks_created: usize,
    /// Number of described frames indexed.
    pub frames_indexed: usize,
}
