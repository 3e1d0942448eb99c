//! Minimal Gemini REST client shared by the embedding and generation providers.

use crate::error::{Result, VidlensError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default timeout for Gemini API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Thin wrapper over `reqwest` for `models/{model}:{method}` calls.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client using `GEMINI_API_KEY` (or `GOOGLE_API_KEY`).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                VidlensError::Config("GEMINI_API_KEY environment variable not set".to_string())
            })?;

        Self::new(api_key, API_BASE)
    }

    /// Create a client with an explicit key and base URL.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fully qualified model name, e.g. `models/text-embedding-004`.
    pub fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    /// POST `body` to `models/{model}:{method}` and decode the response.
    pub async fn call<B, R>(&self, model: &str, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}:{}", self.base_url, Self::model_name(model), method);
        debug!(%url, "Calling Gemini API");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let preview: String = text.chars().take(500).collect();
            return Err(VidlensError::Gemini(format!("{}: {}", status, preview)));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name() {
        assert_eq!(GeminiClient::model_name("text-embedding-004"), "models/text-embedding-004");
        assert_eq!(GeminiClient::model_name("models/gemini-2.5-pro"), "models/gemini-2.5-pro");
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = GeminiClient::new("key", "http://localhost:9999/v1beta/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/v1beta");
    }
}
