mod client;
pub(crate) mod types;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AiError, Result};
use crate::traits::{ChatModel, Completion, CompletionRequest};

use client::{OpenAiClient, OPENAI_API_URL};
use types::{ChatRequest, WireMessage};

// =============================================================================
// OpenAi
// =============================================================================

/// OpenAI (or OpenAI-compatible) chat-completion model.
pub struct OpenAi {
    model: String,
    base_url: String,
    client: OpenAiClient,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, model, OPENAI_API_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::Config("OpenAI API key is empty".into()));
        }
        let base_url = base_url.into();
        let client = OpenAiClient::new(&api_key, &base_url)?;
        Ok(Self {
            model: model.into(),
            base_url,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatModel for OpenAi {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let mut wire = ChatRequest::new(&self.model)
            .messages(request.messages.iter().map(WireMessage::from))
            .sampling(request.temperature, request.max_output_tokens);
        if request.json_output {
            wire = wire.json_object();
        }

        let response = self.client.chat(&wire).await?;
        let usage = response.usage.map(Into::into);

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::EmptyResponse(self.model.clone()))?;

        debug!(
            model = %self.model,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "OpenAI chat response"
        );

        let content = choice
            .message
            .content
            .ok_or_else(|| AiError::EmptyResponse(self.model.clone()))?;

        Ok(Completion {
            content,
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}
