//! Gemini `generateContent` implementation.

use super::{Generator, InlineImage};
use crate::error::{Result, VidlensError};
use crate::gemini::GeminiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: &'a str,
    },
    FileData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        #[serde(rename = "fileUri")]
        file_uri: &'a str,
    },
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Gemini-based generator.
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
    temperature: f32,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: GeminiClient::model_name(model),
            temperature,
        }
    }

    /// Create a generator with the API key from the environment.
    pub fn from_env(model: &str, temperature: f32) -> Result<Self> {
        Ok(Self::new(GeminiClient::from_env()?, model, temperature))
    }

    fn request<'a>(&self, parts: Vec<Part<'a>>) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: [Content { role: "user", parts }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    async fn complete(&self, parts: Vec<Part<'_>>) -> Result<String> {
        let response: GenerateResponse = self
            .client
            .call(&self.model, "generateContent", &self.request(parts))
            .await?;

        let text = response
            .text()
            .ok_or_else(|| VidlensError::Generation("Empty response from model".to_string()))?;

        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(vec![Part::Text(prompt)]).await
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn describe_image(&self, prompt: &str, image: InlineImage<'_>) -> Result<String> {
        self.complete(vec![
            Part::InlineData {
                mime_type: image.mime_type,
                data: image.data_base64,
            },
            Part::Text(prompt),
        ])
        .await
    }

    #[instrument(skip_all, fields(model = %self.model, video_url = %video_url))]
    async fn analyze_video(&self, prompt: &str, video_url: &str) -> Result<String> {
        self.complete(vec![
            Part::FileData {
                mime_type: "video/*",
                file_uri: video_url,
            },
            Part::Text(prompt),
        ])
        .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
