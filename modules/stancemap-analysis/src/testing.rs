// Test mocks for the analysis pipeline.
//
// - MockChatModel (ChatModel): scripted replies, records every request.

use std::collections::VecDeque;
use std::sync::Mutex;

use ai_client::{AiError, ChatModel, Completion, CompletionRequest, TokenUsage};
use async_trait::async_trait;
use serde_json::json;

// ---------------------------------------------------------------------------
// MockChatModel
// ---------------------------------------------------------------------------

/// Replies from a queue; once the queue is empty, repeats the fallback reply.
/// Builder pattern: `.reply()`, `.fail()`, `.fallback()`.
pub struct MockChatModel {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    fallback: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: json!({ "countryPositions": [] }).to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, content: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(content.into()));
        self
    }

    pub fn fail(self, error: AiError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn fallback(mut self, content: impl Into<String>) -> Self {
        self.fallback = content.into();
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> ai_client::Result<Completion> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()));
        let content = next?;
        Ok(Completion {
            content,
            usage: Some(TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            }),
            finish_reason: Some("stop".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A model reply holding one position per `(code, quote, relevance, clarity)`.
pub fn positions_reply(topic: &str, positions: &[(&str, &str, f64, f64)]) -> String {
    let countries: Vec<_> = positions
        .iter()
        .map(|(code, quote, relevance, clarity)| {
            let mut entry = serde_json::Map::new();
            entry.insert(
                code.to_string(),
                json!({
                    "exact_quote": quote,
                    "summarised_stance_in_english": format!("Stance of {code}"),
                    "relevance_to_topic": relevance,
                    "clarity_of_stance": clarity,
                }),
            );
            serde_json::Value::Object(entry)
        })
        .collect();
    json!({ "countryPositions": [{ "topic": topic, "countries": countries }] }).to_string()
}
