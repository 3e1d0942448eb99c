//! In-process fakes for the external collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vidlens::cache::EmbeddingCache;
use vidlens::config::{Prompts, Settings};
use vidlens::embedding::{Embedder, RawEmbeddings, TaskType};
use vidlens::generation::{Generator, InlineImage};
use vidlens::orchestrator::{Components, Orchestrator};
use vidlens::store::MemoryVideoStore;
use vidlens::transcript::{TranscriptEntry, TranscriptSource};
use vidlens::Result;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub struct FakeTranscripts(pub Option<Vec<TranscriptEntry>>);

#[async_trait]
impl TranscriptSource for FakeTranscripts {
    async fn fetch(&self, _video_id: &str) -> Result<Option<Vec<TranscriptEntry>>> {
        Ok(self.0.clone())
    }
}

/// How the fake embedder corrupts its responses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    None,
    DropLast,
    EmptyAt(usize),
    /// Every vector resized to this many dimensions, as after a model change.
    Dimensions(usize),
}

/// Embeds by keyword: "cat" texts point one way, "dog" texts another.
pub struct KeywordEmbedder {
    pub fault: Fault,
    pub query_calls: AtomicUsize,
    pub document_calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(fault: Fault) -> Self {
        Self {
            fault,
            query_calls: AtomicUsize::new(0),
            document_calls: AtomicUsize::new(0),
        }
    }

    fn vector(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        if text.contains("cat") {
            vec![1.0, 0.0, 0.0]
        } else if text.contains("dog") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String], task: TaskType) -> Result<RawEmbeddings> {
        match task {
            TaskType::Query => self.query_calls.fetch_add(1, Ordering::SeqCst),
            TaskType::Document => self.document_calls.fetch_add(1, Ordering::SeqCst),
        };

        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| Self::vector(t)).collect();
        match self.fault {
            Fault::None => {}
            Fault::DropLast => {
                vectors.pop();
            }
            Fault::EmptyAt(index) => {
                if let Some(v) = vectors.get_mut(index) {
                    v.clear();
                }
            }
            Fault::Dimensions(n) => {
                for v in &mut vectors {
                    v.resize(n, 0.0);
                }
            }
        }

        if vectors.len() == 1 {
            Ok(RawEmbeddings::Single(vectors.remove(0)))
        } else {
            Ok(RawEmbeddings::Batch(vectors))
        }
    }

    fn model(&self) -> &str {
        "keyword"
    }
}

pub const SECTIONS_JSON: &str = r#"Here you go:
{"sections": [
  {"title": "Cats", "start_time": 0, "end_time": 30, "summary": "All about the cat"},
  {"title": "Dogs", "start_time": 30, "end_time": 60, "summary": "Then the dog arrives"}
]}"#;

/// Returns section JSON for breakdown prompts and a canned answer otherwise.
pub struct FakeGenerator {
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("section breakdown") {
            Ok(SECTIONS_JSON.to_string())
        } else {
            Ok("The dog shows up at [00:40].".to_string())
        }
    }

    async fn describe_image(&self, _prompt: &str, _image: InlineImage<'_>) -> Result<String> {
        Ok("a cat on a sofa".to_string())
    }

    async fn analyze_video(&self, _prompt: &str, _video_url: &str) -> Result<String> {
        Ok(SECTIONS_JSON.to_string())
    }

    fn model(&self) -> &str {
        "fake"
    }
}

pub fn entries() -> Vec<TranscriptEntry> {
    vec![
        TranscriptEntry::new("Today we meet a cat", 0.0, 5.0),
        TranscriptEntry::new("the cat sleeps", 10.0, 5.0),
        TranscriptEntry::new("now the dog barks", 40.0, 5.0),
    ]
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub embedder: Arc<KeywordEmbedder>,
    pub generator: Arc<FakeGenerator>,
}

pub fn harness(transcript: Option<Vec<TranscriptEntry>>, fault: Fault, settings: Settings) -> Harness {
    harness_on(Arc::new(MemoryVideoStore::new()), transcript, fault, settings)
}

/// A harness publishing into an existing store.
pub fn harness_on(
    store: Arc<MemoryVideoStore>,
    transcript: Option<Vec<TranscriptEntry>>,
    fault: Fault,
    settings: Settings,
) -> Harness {
    let embedder = Arc::new(KeywordEmbedder::new(fault));
    let generator = Arc::new(FakeGenerator::new());
    let components = Components {
        transcripts: Arc::new(FakeTranscripts(transcript)),
        frames: None,
        embedder: embedder.clone(),
        generator: generator.clone(),
        store,
        cache: Arc::new(EmbeddingCache::new(settings.cache.capacity).unwrap()),
    };
    let orchestrator = Orchestrator::with_components(settings, Prompts::default(), components).unwrap();

    Harness {
        orchestrator,
        embedder,
        generator,
    }
}
