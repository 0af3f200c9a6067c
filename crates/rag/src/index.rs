//! Scheme index service handle
//!
//! `SchemeIndex` bundles the corpus, vector index and embedder. It is built
//! once at startup, never mutated afterwards, and shared through `Arc`.
//!
//! Startup in strict environments (staging, production) fails on an empty
//! corpus or unreachable index. Development starts in degraded mode instead:
//! every search returns no candidates and `health()` reports why.

use serde::Serialize;
use std::sync::Arc;

use scheme_saathi_config::{IndexBackend, Settings};
use scheme_saathi_core::{CorpusProvider, TextEmbedder, VectorIndex};

use crate::corpus::SchemeCorpus;
use crate::embeddings::build_embedder;
use crate::memory_index::MemoryIndex;
use crate::vector_store::{QdrantIndex, QdrantIndexConfig};
use crate::RagError;

/// Snapshot of index readiness
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHealth {
    pub corpus_size: usize,
    pub index_size: usize,
    pub backend: String,
    pub embedder: String,
    pub degraded: bool,
}

/// Read-only retrieval resources
pub struct SchemeIndex {
    corpus: Arc<dyn CorpusProvider>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn TextEmbedder>,
}

impl SchemeIndex {
    /// Assemble from already-built parts
    pub fn from_parts(
        corpus: Arc<dyn CorpusProvider>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Self {
        Self {
            corpus,
            index,
            embedder,
        }
    }

    /// Load corpus, embedder and vector index as configured
    pub async fn open(settings: &Settings) -> Result<Self, RagError> {
        let strict = settings.environment.is_strict();

        let corpus = match SchemeCorpus::load(
            &settings.corpus.schemes_path,
            settings.corpus.min_quality_score,
        ) {
            Ok(corpus) => corpus,
            Err(e) if !strict => {
                tracing::warn!(error = %e, "Starting with an empty scheme corpus");
                SchemeCorpus::empty()
            },
            Err(e) => return Err(e),
        };

        if corpus.is_empty() && strict {
            return Err(RagError::Corpus(format!(
                "No schemes loaded from {}",
                settings.corpus.schemes_path.display()
            )));
        }

        let embedder = build_embedder(&settings.embedding)?;

        let index: Arc<dyn VectorIndex> = match settings.rag.backend {
            IndexBackend::Memory => {
                let memory = match &settings.corpus.embeddings_path {
                    Some(path) => MemoryIndex::load_embeddings(path, embedder.dim()),
                    None => MemoryIndex::build(&corpus, embedder.as_ref()).await,
                };
                match memory {
                    Ok(memory) => Arc::new(memory),
                    Err(e) if strict => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "Starting with an empty vector index");
                        Arc::new(MemoryIndex::new(embedder.dim()))
                    },
                }
            },
            IndexBackend::Qdrant => {
                let qdrant = QdrantIndex::connect(QdrantIndexConfig::from_settings(
                    &settings.rag,
                    embedder.dim(),
                ))?;
                match qdrant.collection_exists().await {
                    Ok(true) => {},
                    Ok(false) if strict => {
                        return Err(RagError::Index(format!(
                            "Qdrant collection '{}' does not exist",
                            qdrant.collection()
                        )))
                    },
                    Ok(false) => tracing::warn!(
                        collection = qdrant.collection(),
                        "Qdrant collection missing, searches will return nothing"
                    ),
                    Err(e) if strict => return Err(e),
                    Err(e) => tracing::warn!(error = %e, "Qdrant unreachable at startup"),
                }
                Arc::new(qdrant)
            },
        };

        let scheme_index = Self::from_parts(Arc::new(corpus), index, embedder);
        let health = scheme_index.health().await;
        if health.degraded {
            tracing::warn!(
                corpus_size = health.corpus_size,
                index_size = health.index_size,
                backend = %health.backend,
                "Scheme index running in degraded mode"
            );
        } else {
            tracing::info!(
                corpus_size = health.corpus_size,
                index_size = health.index_size,
                backend = %health.backend,
                embedder = %health.embedder,
                "Scheme index ready"
            );
        }
        Ok(scheme_index)
    }

    pub fn corpus(&self) -> &Arc<dyn CorpusProvider> {
        &self.corpus
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn TextEmbedder> {
        &self.embedder
    }

    /// Degraded when either the corpus or the vector index is empty or
    /// the index cannot be reached
    pub async fn health(&self) -> IndexHealth {
        let index_size = match self.index.len().await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(backend = self.index.name(), error = %e, "Index size unavailable");
                None
            },
        };
        let corpus_size = self.corpus.len();

        IndexHealth {
            corpus_size,
            index_size: index_size.unwrap_or(0),
            backend: self.index.name().to_string(),
            embedder: self.embedder.name().to_string(),
            degraded: corpus_size == 0 || index_size.map_or(true, |n| n == 0),
        }
    }
}
