//! Text generation providers.
//!
//! Used for section breakdowns, answers, frame descriptions and visual search
//! narratives.

mod gemini;
mod openai;

pub use gemini::GeminiGenerator;
pub use openai::OpenAIGenerator;

use crate::config::GenerationSettings;
use crate::error::{Result, VidlensError};
use async_trait::async_trait;
use std::sync::Arc;

/// An image attached to a generation request.
#[derive(Debug, Clone, Copy)]
pub struct InlineImage<'a> {
    pub mime_type: &'a str,
    /// Base64 payload without a data URL prefix.
    pub data_base64: &'a str,
}

/// Trait for generation providers.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a text prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Complete a prompt about an image.
    async fn describe_image(&self, prompt: &str, image: InlineImage<'_>) -> Result<String>;

    /// Complete a prompt about a hosted video the model can watch directly.
    async fn analyze_video(&self, _prompt: &str, video_url: &str) -> Result<String> {
        Err(VidlensError::Generation(format!(
            "provider cannot analyze videos directly ({})",
            video_url
        )))
    }

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Create the generator selected in the configuration.
pub fn create_generator(settings: &GenerationSettings) -> Result<Arc<dyn Generator>> {
    match settings.provider.to_lowercase().as_str() {
        "gemini" | "google" => Ok(Arc::new(GeminiGenerator::from_env(
            &settings.model,
            settings.temperature,
        )?)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(
            &settings.model,
            settings.temperature,
        )?)),
        other => Err(VidlensError::Config(format!(
            "Unknown generation provider: {}",
            other
        ))),
    }
}
