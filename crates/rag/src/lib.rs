//! Semantic retrieval over the scheme corpus
//!
//! Features:
//! - Corpus loading from the ingestion JSON (object, array or concatenated objects)
//! - Catalogue helpers (categories, state/category filters, summaries)
//! - Embedders: deterministic hashing, Ollama/OpenAI-compatible HTTP, ONNX (`onnx` feature)
//! - Vector indexes: in-memory cosine index and Qdrant
//! - `SchemeIndex` service handle with startup health checks
//! - `SemanticRetriever` with profile-enhanced queries and similarity thresholding

pub mod corpus;
pub mod embeddings;
pub mod http_embeddings;
pub mod index;
pub mod memory_index;
pub mod retriever;
pub mod vector_store;

pub use corpus::{embedding_text, CorpusStats, SchemeCorpus};
pub use embeddings::{build_embedder, HashEmbedder};
#[cfg(feature = "onnx")]
pub use embeddings::OnnxEmbedder;
pub use http_embeddings::{HttpEmbedder, HttpEmbedderConfig};
pub use index::{IndexHealth, SchemeIndex};
pub use memory_index::MemoryIndex;
pub use retriever::{distance_to_similarity, RetrieverConfig, SemanticRetriever};
pub use vector_store::{QdrantIndex, QdrantIndexConfig};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

impl From<RagError> for scheme_saathi_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Embedding(msg) | RagError::Model(msg) => {
                scheme_saathi_core::Error::Embedding(msg)
            },
            RagError::VectorStore(msg) | RagError::Index(msg) | RagError::Connection(msg) => {
                scheme_saathi_core::Error::Index(msg)
            },
            RagError::Corpus(msg) => scheme_saathi_core::Error::Corpus(msg),
            other => scheme_saathi_core::Error::Rag(other.to_string()),
        }
    }
}
