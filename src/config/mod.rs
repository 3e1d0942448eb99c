//! Configuration module for vidlens.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, SectionPrompts, VisualPrompts};
pub use settings::{
    CacheSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings,
    PromptSettings, RagSettings, RateLimitSettings, ServerSettings, Settings, StoreSettings,
    VisualSettings,
};
