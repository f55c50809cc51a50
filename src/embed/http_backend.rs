//! HTTP embedding backend
//!
//! Talks to an embedding sidecar over HTTP. One request per batch, no
//! retries: a failed or timed-out call surfaces as an upstream error and the
//! caller decides whether to try again.

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbedTextRequest {
    model: String,
    inputs: Vec<String>,
}

/// Accepts the common response shapes embedding servers use
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Embeddings { embeddings: Vec<Vec<f32>> },
    Vectors { vectors: Vec<Vec<f32>> },
    Data { data: Vec<EmbeddingData> },
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            EmbeddingResponse::Embeddings { embeddings } => embeddings,
            EmbeddingResponse::Vectors { vectors } => vectors,
            EmbeddingResponse::Data { data } => data.into_iter().map(|d| d.embedding).collect(),
        }
    }
}

pub struct HttpEmbedder {
    client: Client,
    base_url: Url,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            dimension: config.resolved_dimension(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid embedding backend URL: {}", e)))
    }

    fn validate_dimensions(&self, embeddings: &[Vec<f32>]) -> Result<()> {
        if let Some(mismatch) = embeddings.iter().find(|vec| vec.len() != self.dimension) {
            return Err(Error::Upstream(format!(
                "Embedding dimension mismatch for model '{}': expected {}, got {}",
                self.model,
                self.dimension,
                mismatch.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let count = texts.len();
        let url = self.endpoint("/v1/embed/text")?;
        let request = EmbedTextRequest {
            model: self.model.clone(),
            inputs: texts,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("embedding backend: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Upstream(format!("embedding backend: {}", e)))?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("embedding backend: {}", e)))?;

        let embeddings = parsed.into_embeddings();
        if embeddings.len() != count {
            return Err(Error::Upstream(format!(
                "Embedding backend returned {} vectors for {} inputs",
                embeddings.len(),
                count
            )));
        }

        self.validate_dimensions(&embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            model: "test-model".to_string(),
            dimension,
            backend_url: url.to_string(),
            batch_size: 8,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_response_shapes_parse() {
        let embeddings: EmbeddingResponse =
            serde_json::from_str(r#"{"embeddings": [[0.1, 0.2]]}"#).unwrap();
        assert_eq!(embeddings.into_embeddings(), vec![vec![0.1, 0.2]]);

        let vectors: EmbeddingResponse =
            serde_json::from_str(r#"{"vectors": [[0.3, 0.4]]}"#).unwrap();
        assert_eq!(vectors.into_embeddings(), vec![vec![0.3, 0.4]]);

        let data: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [0.5, 0.6]}]}"#).unwrap();
        assert_eq!(data.into_embeddings(), vec![vec![0.5, 0.6]]);
    }

    #[tokio::test]
    async fn test_embed_roundtrip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[0.1, 0.2, 0.3]]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&test_config(&server.uri(), 3)).unwrap();
        let result = embedder.embed(vec!["hello".to_string()]).await.unwrap();

        assert_eq!(result, vec![vec![0.1, 0.2, 0.3]]);
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[0.1, 0.2]]})),
            )
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&test_config(&server.uri(), 3)).unwrap();
        let err = embedder
            .embed(vec!["hello".to_string()])
            .await
            .expect_err("should reject mismatched dimension");

        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_embed_server_error_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&test_config(&server.uri(), 3)).unwrap();
        let err = embedder
            .embed(vec!["hello".to_string()])
            .await
            .expect_err("should surface server error");

        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_embed_empty_batch_skips_request() {
        let config = test_config("http://127.0.0.1:1", 3);
        let embedder = HttpEmbedder::new(&config).unwrap();

        let result = embedder.embed(Vec::new()).await.unwrap();
        assert!(result.is_empty());
    }
}
