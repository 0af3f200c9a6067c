//! In-memory cosine index
//!
//! Brute-force nearest-neighbour search over normalised vectors. The corpus
//! holds a few thousand schemes, so a linear scan per query is cheap and
//! needs no external service.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use scheme_saathi_core::{CorpusProvider, IndexHit, TextEmbedder, VectorIndex};

use crate::corpus::embedding_text;
use crate::RagError;

/// Precomputed embeddings file: either `{"id": [..]}` or a list of entries
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingsFile {
    Map(HashMap<String, Vec<f32>>),
    List(Vec<EmbeddingEntry>),
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    scheme_id: String,
    embedding: Vec<f32>,
}

/// Brute-force vector index
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    positions: HashMap<String, usize>,
}

impl MemoryIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            ids: Vec::new(),
            vectors: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn size(&self) -> usize {
        self.ids.len()
    }

    /// Add or replace a vector
    pub fn insert(&mut self, scheme_id: impl Into<String>, embedding: Vec<f32>) -> Result<(), RagError> {
        if embedding.len() != self.dim {
            return Err(RagError::Index(format!(
                "Expected {}-dim vector, got {}",
                self.dim,
                embedding.len()
            )));
        }

        let scheme_id = scheme_id.into();
        let vector = normalized(embedding);
        match self.positions.get(&scheme_id) {
            Some(&i) => self.vectors[i] = vector,
            None => {
                self.positions.insert(scheme_id.clone(), self.ids.len());
                self.ids.push(scheme_id);
                self.vectors.push(vector);
            },
        }
        Ok(())
    }

    /// Embed every scheme in the corpus
    pub async fn build(
        corpus: &dyn CorpusProvider,
        embedder: &dyn TextEmbedder,
    ) -> Result<Self, RagError> {
        let mut index = Self::new(embedder.dim());
        for scheme in corpus.get_all_schemes() {
            let embedding = embedder
                .embed(&embedding_text(scheme))
                .await
                .map_err(|e| RagError::Embedding(format!("{}: {}", scheme.scheme_id, e)))?;
            index.insert(scheme.scheme_id.clone(), embedding)?;
        }

        tracing::info!(
            vectors = index.size(),
            embedder = embedder.name(),
            "Built in-memory scheme index"
        );
        Ok(index)
    }

    /// Load precomputed embeddings; vectors of the wrong dimension are skipped
    pub fn load_embeddings(path: &Path, dim: usize) -> Result<Self, RagError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RagError::Index(format!("Failed to read {}: {}", path.display(), e)))?;
        let file: EmbeddingsFile = serde_json::from_str(&content)
            .map_err(|e| RagError::Index(format!("Invalid embeddings file: {}", e)))?;

        let entries: Vec<(String, Vec<f32>)> = match file {
            EmbeddingsFile::Map(map) => {
                let mut entries: Vec<_> = map.into_iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                entries
            },
            EmbeddingsFile::List(list) => list
                .into_iter()
                .map(|e| (e.scheme_id, e.embedding))
                .collect(),
        };

        let mut index = Self::new(dim);
        let mut skipped = 0usize;
        for (scheme_id, embedding) in entries {
            if index.insert(scheme_id, embedding).is_err() {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, dim, "Skipped embeddings with wrong dimension");
        }

        tracing::info!(
            path = %path.display(),
            vectors = index.size(),
            "Loaded precomputed scheme embeddings"
        );
        Ok(index)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn query(&self, embedding: &[f32], n: usize) -> scheme_saathi_core::Result<Vec<IndexHit>> {
        if embedding.len() != self.dim {
            return Err(RagError::Index(format!(
                "Query has {} dims, index has {}",
                embedding.len(),
                self.dim
            ))
            .into());
        }

        let query = normalized(embedding.to_vec());
        let mut hits: Vec<IndexHit> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(id, vector)| {
                let similarity: f32 = query.iter().zip(vector).map(|(a, b)| a * b).sum();
                IndexHit::new(id.clone(), 1.0 - similarity)
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(n);
        Ok(hits)
    }

    async fn len(&self) -> scheme_saathi_core::Result<usize> {
        Ok(self.size())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn normalized(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
