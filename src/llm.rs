//! Completion provider client
//!
//! Talks to an OpenAI-compatible chat-completions endpoint over bearer auth.
//! The pipeline only depends on the [`CompletionProvider`] trait, so tests
//! swap in canned providers without touching the network.

use crate::error::{AskError, Result};
use crate::prompts::{Prompt, SYSTEM_PROMPT};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_TOKENS: u32 = 1500;

/// Anything that can turn a prompt into completion text. One attempt per
/// call; retry policy belongs to the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// HTTP client for the completion endpoint. Requests are sent with
/// temperature 0.0 so identical prompts translate as stably as the model
/// allows.
pub struct LlmClient {
    api_key: String,
    endpoint: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Build from the environment: `GROQ_API_KEY` is required, and
    /// `GROQ_ENDPOINT` / `GROQ_MODEL` override the defaults when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| AskError::Provider {
            status: None,
            message: "GROQ_API_KEY is not set".to_string(),
        })?;
        let mut client = Self::new(api_key);
        if let Ok(endpoint) = std::env::var("GROQ_ENDPOINT") {
            client = client.with_endpoint(endpoint);
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            client = client.with_model(model);
        }
        Ok(client)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt.text}
            ],
            "temperature": 0.0,
            "max_tokens": MAX_TOKENS
        });

        debug!(
            kind = ?prompt.kind,
            model = %self.model,
            prompt_bytes = prompt.text.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AskError::Provider {
                status: None,
                message: format!("request failed: {}", e),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| AskError::Provider {
            status: Some(status),
            message: format!("failed to read response body: {}", e),
        })?;

        if !(200..300).contains(&status) {
            // Prefer the structured error body when the endpoint sends one.
            let message = match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => value.to_string(),
                Err(_) => text,
            };
            return Err(AskError::Provider {
                status: Some(status),
                message,
            });
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&text).map_err(|_| AskError::Provider {
                status: Some(status),
                message: "response body is not valid JSON".to_string(),
            })?;

        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AskError::Provider {
                status: Some(status),
                message: "no content in completion response".to_string(),
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptKind;

    struct CannedProvider(String);

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        async fn complete(&self, _prompt: &Prompt) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let provider: Box<dyn CompletionProvider> =
            Box::new(CannedProvider("SELECT 1".to_string()));
        let prompt = Prompt {
            kind: PromptKind::SqlGeneration,
            text: "anything".to_string(),
        };
        assert_eq!(provider.complete(&prompt).await.unwrap(), "SELECT 1");
    }

    #[test]
    fn test_client_defaults() {
        let client = LlmClient::new("key".to_string());
        assert_eq!(client.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_builder_overrides() {
        let client = LlmClient::new("key".to_string())
            .with_endpoint("http://localhost:9999/v1/chat/completions")
            .with_model("test-model")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(client.endpoint, "http://localhost:9999/v1/chat/completions");
        assert_eq!(client.model, "test-model");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }
}
