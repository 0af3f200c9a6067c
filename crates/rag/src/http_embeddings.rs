//! HTTP Embeddings
//!
//! Calls a remote embedding service. Two wire formats are supported:
//! Ollama (`POST /api/embed`, `{"embeddings": [[..]]}`) and OpenAI-compatible
//! servers (`POST /v1/embeddings`, `{"data": [{"embedding": [..]}]}`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use scheme_saathi_config::{EmbeddingConfig, HttpEmbeddingApi};
use scheme_saathi_core::TextEmbedder;

use crate::RagError;

/// HTTP embedder configuration
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    pub api: HttpEmbeddingApi,
    /// Base URL, without the API path
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Expected embedding dimension
    pub embedding_dim: usize,
    pub timeout: Duration,
}

impl From<&EmbeddingConfig> for HttpEmbedderConfig {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            api: config.api,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            embedding_dim: config.dim,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self::from(&EmbeddingConfig::default())
    }
}

/// Request body, identical for both APIs
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response from Ollama embedding API
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Response from OpenAI-compatible embedding APIs
#[derive(Debug, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

/// Remote embedder
pub struct HttpEmbedder {
    client: Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Connection(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        match self.config.api {
            HttpEmbeddingApi::Ollama => format!("{}/api/embed", self.config.endpoint),
            HttpEmbeddingApi::OpenAi => format!("{}/v1/embeddings", self.config.endpoint),
        }
    }

    async fn embed_raw(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: text,
        };

        let mut builder = self.client.post(self.url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Embedding endpoint returned {} - {}",
                status, text
            )));
        }

        let embedding = match self.config.api {
            HttpEmbeddingApi::Ollama => response
                .json::<OllamaEmbedResponse>()
                .await
                .map_err(|e| RagError::Embedding(format!("Failed to parse Ollama response: {}", e)))?
                .embeddings
                .into_iter()
                .next(),
            HttpEmbeddingApi::OpenAi => response
                .json::<OpenAiEmbedResponse>()
                .await
                .map_err(|e| RagError::Embedding(format!("Failed to parse embedding response: {}", e)))?
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding),
        }
        .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()))?;

        if embedding.len() != self.config.embedding_dim {
            return Err(RagError::Embedding(format!(
                "Expected {}-dim embedding from {}, got {}",
                self.config.embedding_dim,
                self.config.model,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> scheme_saathi_core::Result<Vec<f32>> {
        Ok(self.embed_raw(text).await?)
    }

    fn dim(&self) -> usize {
        self.config.embedding_dim
    }

    fn name(&self) -> &str {
        match self.config.api {
            HttpEmbeddingApi::Ollama => "ollama",
            HttpEmbeddingApi::OpenAi => "openai",
        }
    }
}
