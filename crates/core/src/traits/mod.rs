//! Retrieval seams
//!
//! The recommendation pipeline depends only on these traits, so corpus
//! storage, vector index and embedding backends can be swapped by
//! configuration or replaced with fixtures in tests.
//!
//! ```text
//!   CorpusProvider: scheme records keyed by id
//!   VectorIndex:    nearest-neighbour search over scheme embeddings
//!   TextEmbedder:   text -> dense vector
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::scheme::SchemeRecord;
use crate::Result;

/// Read-only access to the loaded scheme corpus
pub trait CorpusProvider: Send + Sync {
    /// All schemes in load order
    fn get_all_schemes(&self) -> &[Arc<SchemeRecord>];

    fn get_by_id(&self, scheme_id: &str) -> Option<Arc<SchemeRecord>>;

    fn len(&self) -> usize {
        self.get_all_schemes().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A nearest-neighbour hit: scheme id plus cosine distance (`1 - similarity`)
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub scheme_id: String,
    pub distance: f32,
}

impl IndexHit {
    pub fn new(scheme_id: impl Into<String>, distance: f32) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            distance,
        }
    }
}

/// Vector index over scheme embeddings
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `n` hits ordered by ascending distance
    async fn query(&self, embedding: &[f32], n: usize) -> Result<Vec<IndexHit>>;

    /// Number of indexed vectors
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Backend name for logs and health output
    fn name(&self) -> &str;
}

/// Text embedding model
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimension
    fn dim(&self) -> usize;

    fn name(&self) -> &str;
}
