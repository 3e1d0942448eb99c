//! vidlens - Video knowledge base
//!
//! Turns YouTube videos into a searchable, timestamped knowledge base.
//!
//! # Overview
//!
//! vidlens allows you to:
//! - Index a video from its captions, or from a model's own analysis when no
//!   captions exist
//! - Ask questions and get answers citing `[MM:SS]` moments
//! - Search for visual moments, optionally backed by described frames
//! - Serve all of the above over HTTP with per-client rate limiting
//!
//! # Architecture
//!
//! The retrieval core is synchronous and in-memory:
//!
//! - `cache` - Content-addressed LRU cache of query embeddings
//! - `chunking` - Folding timed captions into bounded chunks
//! - `embedding` - Embedding providers and batch validation
//! - `ranking` - Cosine top-k ranking with confidence tiers
//! - `rate_limit` - Dual-window per-client rate limiting
//!
//! Around it sit the collaborators and surfaces:
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - Caption retrieval and model output helpers
//! - `media` - Video download and frame capture
//! - `generation` - Text and image generation providers
//! - `store` - Video record persistence
//! - `rag` - Question answering and visual search
//! - `orchestrator` - Pipeline coordination
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use vidlens::config::Settings;
//! use vidlens::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator
//!         .process_video("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("Indexed {} chunks", result.chunks_created);
//!
//!     let answer = orchestrator.ask(&result.video_id, "What is this about?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod ranking;
pub mod rate_limit;
pub mod server;
pub mod store;
pub mod transcript;
pub mod unit;
pub mod validation;

pub use error::{Result, VidlensError};
