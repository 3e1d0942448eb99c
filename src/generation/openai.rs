//! OpenAI chat completions implementation.

use super::{Generator, InlineImage};
use crate::error::{Result, VidlensError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageUrlArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based generator.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    pub fn new(model: &str, temperature: f32) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            temperature,
        })
    }

    async fn complete(&self, message: ChatCompletionRequestMessage) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidlensError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidlensError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| VidlensError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| VidlensError::Generation(e.to_string()))?;

        self.complete(message.into()).await
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn describe_image(&self, prompt: &str, image: InlineImage<'_>) -> Result<String> {
        let data_url = format!("data:{};base64,{}", image.mime_type, image.data_base64);

        let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(prompt)
                .build()
                .map_err(|e| VidlensError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(data_url)
                        .build()
                        .map_err(|e| VidlensError::Generation(e.to_string()))?,
                )
                .build()
                .map_err(|e| VidlensError::Generation(e.to_string()))?
                .into(),
        ];

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(parts)
            .build()
            .map_err(|e| VidlensError::Generation(e.to_string()))?;

        self.complete(message.into()).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
