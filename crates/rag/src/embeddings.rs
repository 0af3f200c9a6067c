//! Text Embeddings
//!
//! Embedders turn the enhanced user query (and scheme texts, when the
//! in-memory index is built at startup) into dense vectors.

use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "onnx")]
use ndarray::Array2;
#[cfg(feature = "onnx")]
use ort::{session::builder::GraphOptimizationLevel, session::Session, value::Tensor};
#[cfg(feature = "onnx")]
use parking_lot::Mutex;
#[cfg(feature = "onnx")]
use std::path::Path;
#[cfg(feature = "onnx")]
use tokenizers::Tokenizer;

use scheme_saathi_config::{EmbeddingConfig, EmbeddingProvider};
use scheme_saathi_core::TextEmbedder;

use crate::http_embeddings::{HttpEmbedder, HttpEmbedderConfig};
use crate::RagError;

/// Build the embedder selected by configuration
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn TextEmbedder>, RagError> {
    let embedder: Arc<dyn TextEmbedder> = match config.provider {
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(config.dim)),
        EmbeddingProvider::Http => Arc::new(HttpEmbedder::new(HttpEmbedderConfig::from(config))?),
        #[cfg(feature = "onnx")]
        EmbeddingProvider::Onnx => {
            let model_path = config
                .model_path
                .as_deref()
                .ok_or_else(|| RagError::Model("embedding.model_path is not set".to_string()))?;
            let tokenizer_path = config
                .tokenizer_path
                .clone()
                .unwrap_or_else(|| model_path.with_file_name("tokenizer.json"));
            Arc::new(OnnxEmbedder::new(model_path, &tokenizer_path, config.dim)?)
        },
        #[cfg(not(feature = "onnx"))]
        EmbeddingProvider::Onnx => {
            return Err(RagError::Model(
                "ONNX embeddings require the `onnx` feature".to_string(),
            ))
        },
    };

    tracing::info!(
        embedder = embedder.name(),
        dim = embedder.dim(),
        "Embedder ready"
    );
    Ok(embedder)
}

fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}

/// Deterministic feature-hashing embedder (no model required)
///
/// Each lowercase alphanumeric token is hashed (FNV-1a) into one of `dim`
/// buckets and the counts are L2-normalised, so texts sharing words have
/// positive cosine similarity. Used offline and in tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Embed synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dim];

        let lower = text.to_lowercase();
        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let idx = (fnv1a(token.as_bytes()) % self.dim as u64) as usize;
            embedding[idx] += 1.0;
        }

        normalize(&mut embedding);
        embedding
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    async fn embed(&self, text: &str) -> scheme_saathi_core::Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Sentence encoder running an ONNX model (e.g. all-MiniLM-L6-v2)
///
/// Mean-pools `last_hidden_state` over the attention mask and normalises.
#[cfg(feature = "onnx")]
pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    dim: usize,
    max_seq_len: usize,
}

#[cfg(feature = "onnx")]
impl OnnxEmbedder {
    const OUTPUT_NAME: &'static str = "last_hidden_state";

    pub fn new(model_path: &Path, tokenizer_path: &Path, dim: usize) -> Result<Self, RagError> {
        let session = Session::builder()
            .map_err(|e| RagError::Model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RagError::Model(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| RagError::Model(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| RagError::Model(e.to_string()))?;

        let tokenizer =
            Tokenizer::from_file(tokenizer_path).map_err(|e| RagError::Model(e.to_string()))?;

        tracing::info!(model = %model_path.display(), dim, "Loaded ONNX embedding model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            dim,
            max_seq_len: 256,
        })
    }

    fn embed_blocking(
        session: &Mutex<Session>,
        tokenizer: &Tokenizer,
        text: &str,
        dim: usize,
        max_seq_len: usize,
    ) -> Result<Vec<f32>, RagError> {
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let len = encoding.get_ids().len().min(max_seq_len).max(1);
        let mut input_ids = vec![0i64; len];
        let mut attention_mask = vec![0i64; len];
        let mut token_type_ids = vec![0i64; len];
        for j in 0..encoding.get_ids().len().min(len) {
            input_ids[j] = encoding.get_ids()[j] as i64;
            attention_mask[j] = encoding.get_attention_mask()[j] as i64;
            token_type_ids[j] = encoding.get_type_ids()[j] as i64;
        }

        let mask_copy = attention_mask.clone();
        let input_ids = Array2::from_shape_vec((1, len), input_ids)
            .map_err(|e| RagError::Embedding(e.to_string()))?;
        let attention_mask = Array2::from_shape_vec((1, len), attention_mask)
            .map_err(|e| RagError::Embedding(e.to_string()))?;
        let token_type_ids = Array2::from_shape_vec((1, len), token_type_ids)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let input_ids_tensor =
            Tensor::from_array(input_ids).map_err(|e| RagError::Model(e.to_string()))?;
        let attention_mask_tensor =
            Tensor::from_array(attention_mask).map_err(|e| RagError::Model(e.to_string()))?;
        let token_type_ids_tensor =
            Tensor::from_array(token_type_ids).map_err(|e| RagError::Model(e.to_string()))?;

        let mut session = session.lock();
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor,
            ])
            .map_err(|e| RagError::Model(e.to_string()))?;

        let (shape, hidden) = outputs
            .get(Self::OUTPUT_NAME)
            .ok_or_else(|| RagError::Model(format!("Missing output tensor: {}", Self::OUTPUT_NAME)))?
            .try_extract_tensor::<f32>()
            .map_err(|e| RagError::Model(e.to_string()))?;

        // [batch, seq_len, hidden_dim]
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 {
            return Err(RagError::Model(format!("Unexpected tensor shape: {:?}", dims)));
        }
        let (seq_len, hidden_dim) = (dims[1], dims[2]);

        let mut embedding = vec![0.0f32; dim];
        let mut tokens = 0.0f32;
        for j in 0..seq_len.min(len) {
            if mask_copy[j] == 0 {
                continue;
            }
            tokens += 1.0;
            for k in 0..dim.min(hidden_dim) {
                embedding[k] += hidden[j * hidden_dim + k];
            }
        }
        if tokens > 0.0 {
            for v in &mut embedding {
                *v /= tokens;
            }
        }

        normalize(&mut embedding);
        Ok(embedding)
    }
}

#[cfg(feature = "onnx")]
#[async_trait]
impl TextEmbedder for OnnxEmbedder {
    async fn embed(&self, text: &str) -> scheme_saathi_core::Result<Vec<f32>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();
        let (dim, max_seq_len) = (self.dim, self.max_seq_len);

        let embedding = tokio::task::spawn_blocking(move || {
            Self::embed_blocking(&session, &tokenizer, &text, dim, max_seq_len)
        })
        .await
        .map_err(|e| RagError::Embedding(format!("Embedding task failed: {}", e)))??;

        Ok(embedding)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
