//! Semantic retriever
//!
//! Embeds the user's message enriched with known profile facts, fetches a
//! neighbour pool from the vector index and keeps candidates whose
//! similarity clears the threshold.
//!
//! Retrieval never fails the caller: an empty query, an empty corpus or
//! index, a backend error or a timeout all yield an empty candidate list.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

use scheme_saathi_config::RagConfig;
use scheme_saathi_core::{is_valid_value, CandidateResult, SlotKey, UserContext};

use crate::index::SchemeIndex;
use crate::RagError;

/// Retriever configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Minimum similarity to keep a candidate
    pub similarity_threshold: f32,
    /// Neighbours fetched per requested result
    pub pool_multiplier: usize,
    /// Upper bound on the neighbour pool
    pub pool_cap: usize,
    pub timeout: Duration,
}

impl From<&RagConfig> for RetrieverConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            pool_multiplier: config.pool_multiplier,
            pool_cap: config.pool_cap,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

/// Index distance to similarity in `[0, 1]`
pub fn distance_to_similarity(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Extra query terms for students at a given education level
fn education_expansion(level: &str) -> Option<&'static str> {
    match level {
        "higher" => Some("college degree post matric scholarship"),
        "school" => Some("school pre matric scholarship"),
        "undergraduate" => Some("undergraduate scholarship degree student"),
        "postgraduate" => Some("postgraduate masters fellowship"),
        "phd" => Some("phd doctoral research fellowship"),
        _ => None,
    }
}

/// Semantic search over the scheme index
pub struct SemanticRetriever {
    index: Arc<SchemeIndex>,
    config: RetrieverConfig,
}

impl SemanticRetriever {
    pub fn new(index: Arc<SchemeIndex>, config: RetrieverConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Message text followed by the profile facts that sharpen the search
    pub fn enhanced_query(query: &str, ctx: &UserContext) -> String {
        let mut parts: Vec<String> = vec![query.trim().to_string()];

        if let Some(occupation) = ctx.get(SlotKey::Occupation) {
            parts.push(occupation.to_string());
            if occupation.eq_ignore_ascii_case("student") {
                if let Some(level) = ctx.get_lower(SlotKey::EducationLevel) {
                    if let Some(expansion) = education_expansion(&level) {
                        parts.push(level.clone());
                        parts.push(expansion.to_string());
                    } else {
                        parts.push(level);
                    }
                }
            }
        }
        for key in [SlotKey::State, SlotKey::CasteCategory, SlotKey::Age] {
            if let Some(value) = ctx.get(key).filter(|v| is_valid_value(v)) {
                parts.push(value.to_string());
            }
        }

        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Neighbours to request: `min(top_k * multiplier, cap, index_len)`
    pub fn pool_size(&self, top_k: usize, index_len: usize) -> usize {
        top_k
            .saturating_mul(self.config.pool_multiplier)
            .min(self.config.pool_cap)
            .min(index_len)
    }

    /// Candidates sorted by descending similarity, at most `top_k`
    pub async fn search(&self, query: &str, ctx: &UserContext, top_k: usize) -> Vec<CandidateResult> {
        if query.trim().is_empty() {
            tracing::warn!("Semantic search called with empty query");
            return Vec::new();
        }
        if top_k == 0 {
            return Vec::new();
        }

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.config.timeout, self.try_search(query, ctx, top_k))
            .await
            .unwrap_or_else(|_| Err(RagError::Timeout(self.config.timeout.as_millis() as u64)));
        histogram!("scheme_retrieval_duration_seconds").record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(candidates) => candidates,
            Err(e) => {
                counter!("scheme_retrieval_errors_total").increment(1);
                tracing::error!(
                    error = %e,
                    backend = self.index.index().name(),
                    "Semantic search failed, returning no candidates"
                );
                Vec::new()
            },
        }
    }

    async fn try_search(
        &self,
        query: &str,
        ctx: &UserContext,
        top_k: usize,
    ) -> Result<Vec<CandidateResult>, RagError> {
        let corpus = self.index.corpus();
        if corpus.is_empty() {
            tracing::warn!("Scheme corpus is empty, semantic search degraded");
            return Ok(Vec::new());
        }

        let index_len = self
            .index
            .index()
            .len()
            .await
            .map_err(|e| RagError::Index(e.to_string()))?;
        let pool = self.pool_size(top_k, index_len);
        if pool == 0 {
            tracing::warn!(
                backend = self.index.index().name(),
                "Vector index is empty, semantic search degraded"
            );
            return Ok(Vec::new());
        }

        let enhanced = Self::enhanced_query(query, ctx);
        tracing::debug!(query = %enhanced, pool, top_k, "Semantic search");

        let embedding = self
            .index
            .embedder()
            .embed(&enhanced)
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        let hits = self
            .index
            .index()
            .query(&embedding, pool)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let mut candidates: Vec<CandidateResult> = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(scheme) = corpus.get_by_id(&hit.scheme_id) else {
                tracing::debug!(scheme_id = %hit.scheme_id, "Index hit not in corpus");
                continue;
            };
            let similarity = distance_to_similarity(hit.distance);
            if similarity < self.config.similarity_threshold {
                continue;
            }
            let rounded = (similarity * 10_000.0).round() / 10_000.0;
            candidates.push(CandidateResult::new(scheme, rounded));
        }

        candidates.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_k);

        tracing::debug!(returned = candidates.len(), "Semantic search complete");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scheme_saathi_core::{IndexHit, SchemeRecord, TextEmbedder, VectorIndex};

    use crate::corpus::SchemeCorpus;

    /// Index returning preset hits regardless of the query
    struct FixedIndex {
        hits: Vec<IndexHit>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(&self, _embedding: &[f32], n: usize) -> scheme_saathi_core::Result<Vec<IndexHit>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(scheme_saathi_core::Error::Index("connection refused".to_string()));
            }
            Ok(self.hits.iter().take(n).cloned().collect())
        }

        async fn len(&self) -> scheme_saathi_core::Result<usize> {
            Ok(self.hits.len())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct ZeroEmbedder;

    #[async_trait]
    impl TextEmbedder for ZeroEmbedder {
        async fn embed(&self, _text: &str) -> scheme_saathi_core::Result<Vec<f32>> {
            Ok(vec![0.0; 4])
        }

        fn dim(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "zero"
        }
    }

    fn scheme(id: &str) -> SchemeRecord {
        SchemeRecord {
            scheme_id: id.to_string(),
            scheme_name: id.to_uppercase(),
            ..Default::default()
        }
    }

    fn retriever(ids: &[&str], hits: Vec<IndexHit>) -> SemanticRetriever {
        retriever_with(ids, FixedIndex { hits, fail: false, delay: None })
    }

    fn retriever_with(ids: &[&str], index: FixedIndex) -> SemanticRetriever {
        let corpus = SchemeCorpus::from_records(ids.iter().map(|id| scheme(id)));
        let index = SchemeIndex::from_parts(Arc::new(corpus), Arc::new(index), Arc::new(ZeroEmbedder));
        SemanticRetriever::new(Arc::new(index), RetrieverConfig::default())
    }

    #[test]
    fn test_distance_to_similarity() {
        assert!((distance_to_similarity(0.2) - 0.8).abs() < 1e-6);
        assert_eq!(distance_to_similarity(1.4), 0.0);
        assert_eq!(distance_to_similarity(-0.1), 1.0);
    }

    #[test]
    fn test_enhanced_query() {
        let ctx = UserContext::new()
            .with(SlotKey::Occupation, "student")
            .with(SlotKey::EducationLevel, "higher")
            .with(SlotKey::State, "Karnataka")
            .with(SlotKey::CasteCategory, "SC")
            .with(SlotKey::Age, "19")
            .with(SlotKey::Gender, "female");
        assert_eq!(
            SemanticRetriever::enhanced_query("need a scholarship ", &ctx),
            "need a scholarship student higher college degree post matric scholarship Karnataka SC 19"
        );

        let farmer = UserContext::new()
            .with(SlotKey::Occupation, "farmer")
            .with(SlotKey::EducationLevel, "school");
        assert_eq!(SemanticRetriever::enhanced_query("loan", &farmer), "loan farmer");
        assert_eq!(SemanticRetriever::enhanced_query("loan", &UserContext::new()), "loan");
    }

    #[test]
    fn test_pool_size() {
        let r = retriever(&[], vec![]);
        assert_eq!(r.pool_size(5, 100), 15);
        assert_eq!(r.pool_size(20, 100), 30);
        assert_eq!(r.pool_size(20, 12), 12);
        assert_eq!(r.pool_size(3, 0), 0);
    }

    #[tokio::test]
    async fn test_threshold_sort_and_truncate() {
        let hits = vec![
            IndexHit::new("a", 0.5),
            IndexHit::new("b", 0.1),
            IndexHit::new("c", 0.9),
            IndexHit::new("d", 0.3),
            IndexHit::new("ghost", 0.0),
        ];
        let r = retriever(&["a", "b", "c", "d"], hits);

        let results = r.search("pension", &UserContext::new(), 2).await;
        let ids: Vec<&str> = results.iter().map(|c| c.scheme_id()).collect();
        assert_eq!(ids, vec!["b", "d"]);
        assert!((results[0].match_score - 0.9).abs() < 1e-4);

        let all = r.search("pension", &UserContext::new(), 10).await;
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|c| c.match_score >= 0.3));
        assert!(all.windows(2).all(|w| w[0].match_score >= w[1].match_score));
    }

    #[tokio::test]
    async fn test_empty_query_and_empty_corpus() {
        let r = retriever(&["a"], vec![IndexHit::new("a", 0.1)]);
        assert!(r.search("   ", &UserContext::new(), 5).await.is_empty());

        let empty = retriever(&[], vec![IndexHit::new("a", 0.1)]);
        assert!(empty.search("loan", &UserContext::new(), 5).await.is_empty());

        let no_index = retriever(&["a"], vec![]);
        assert!(no_index.search("loan", &UserContext::new(), 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_returns_empty() {
        let r = retriever_with(
            &["a"],
            FixedIndex {
                hits: vec![IndexHit::new("a", 0.1)],
                fail: true,
                delay: None,
            },
        );
        assert!(r.search("loan", &UserContext::new(), 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_returns_empty() {
        let corpus = SchemeCorpus::from_records(vec![scheme("a")]);
        let index = FixedIndex {
            hits: vec![IndexHit::new("a", 0.1)],
            fail: false,
            delay: Some(Duration::from_millis(200)),
        };
        let handle = SchemeIndex::from_parts(Arc::new(corpus), Arc::new(index), Arc::new(ZeroEmbedder));
        let config = RetrieverConfig {
            timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let r = SemanticRetriever::new(Arc::new(handle), config);
        assert!(r.search("loan", &UserContext::new(), 5).await.is_empty());
    }
}
