//! LLM completion client
//!
//! Thin client for an Anthropic-style messages endpoint. The model name,
//! token budget, and timeout all come from configuration; a failed or
//! timed-out call surfaces as an upstream error with no retry and no
//! substitute answer.

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Trait for completion providers
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for a system prompt + user prompt pair
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug)]
pub struct HttpCompletionClient {
    client: Client,
    base_url: Url,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl HttpCompletionClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url)?;
        let api_key = config.api_key().ok_or_else(|| {
            Error::Config(format!(
                "LLM API key not set; export {}",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join("/v1/messages")
            .map_err(|e| Error::Config(format!("Invalid LLM backend URL: {}", e)))
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(self.endpoint()?)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("llm: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("llm: {}", e)))?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("llm: {}", e)))?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(Error::Upstream(
                "llm: completion contained no text".to_string(),
            ));
        }

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Create a completion client based on configuration
pub fn create_completion_backend(config: &LlmConfig) -> Result<Box<dyn CompletionBackend>> {
    let client = HttpCompletionClient::new(config)?;
    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> LlmConfig {
        LlmConfig {
            backend_url: url.to_string(),
            model: "test-model".to_string(),
            api_key_env: "CANOPY_TEST_LLM_KEY".to_string(),
            max_tokens: 256,
            temperature: 0.0,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_complete_returns_text_blocks() {
        std::env::set_var("CANOPY_TEST_LLM_KEY", "test-key");
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "Mangroves sequester "},
                    {"type": "text", "text": "carbon."}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(&test_config(&server.uri())).unwrap();
        let answer = client.complete("system", "question").await.unwrap();

        assert_eq!(answer, "Mangroves sequester carbon.");
    }

    #[tokio::test]
    async fn test_complete_error_is_upstream_and_not_retried() {
        std::env::set_var("CANOPY_TEST_LLM_KEY", "test-key");
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .complete("system", "question")
            .await
            .expect_err("should surface overload error");

        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let mut config = test_config("http://127.0.0.1:1");
        config.api_key_env = "CANOPY_TEST_LLM_KEY_UNSET".to_string();

        let err = HttpCompletionClient::new(&config).expect_err("key is unset");
        assert!(matches!(err, Error::Config(_)));
    }
}
