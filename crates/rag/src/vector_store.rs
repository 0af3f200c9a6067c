//! Vector Store using Qdrant
//!
//! Scheme vectors live in a Qdrant collection populated by the offline
//! embedding job. Each point carries the scheme id in its payload.

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{point_id::PointIdOptions, value::Kind, ScoredPoint, SearchPointsBuilder},
    Qdrant,
};

use scheme_saathi_config::constants::embedding;
use scheme_saathi_config::RagConfig;
use scheme_saathi_core::{IndexHit, VectorIndex};

use crate::RagError;

/// Payload key holding the scheme id
pub const SCHEME_ID_KEY: &str = "scheme_id";

/// Qdrant index configuration
#[derive(Debug, Clone)]
pub struct QdrantIndexConfig {
    pub endpoint: String,
    pub collection: String,
    /// Vector dimension, must match the embedder
    pub vector_dim: usize,
    pub api_key: Option<String>,
}

impl QdrantIndexConfig {
    pub fn from_settings(rag: &RagConfig, vector_dim: usize) -> Self {
        Self {
            endpoint: rag.endpoint.clone(),
            collection: rag.collection.clone(),
            vector_dim,
            api_key: rag.api_key.clone(),
        }
    }
}

impl Default for QdrantIndexConfig {
    fn default() -> Self {
        Self::from_settings(&RagConfig::default(), embedding::DEFAULT_DIM)
    }
}

/// Qdrant-backed scheme index
pub struct QdrantIndex {
    client: Qdrant,
    config: QdrantIndexConfig,
}

impl QdrantIndex {
    /// Create a client; no request is made until first use
    pub fn connect(config: QdrantIndexConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub async fn collection_exists(&self) -> Result<bool, RagError> {
        self.client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))
    }

    /// Number of points in the collection
    pub async fn points_count(&self) -> Result<u64, RagError> {
        let info = self
            .client
            .collection_info(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(info
            .result
            .map(|r| r.points_count.unwrap_or(0))
            .unwrap_or(0))
    }
}

/// Scheme id from the payload, falling back to the point id
fn hit_from_point(point: ScoredPoint) -> Option<IndexHit> {
    let from_payload = point.payload.get(SCHEME_ID_KEY).and_then(|v| match &v.kind {
        Some(Kind::StringValue(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    });

    let scheme_id = from_payload.or_else(|| {
        point
            .id
            .and_then(|pid| pid.point_id_options)
            .map(|opts| match opts {
                PointIdOptions::Uuid(u) => u,
                PointIdOptions::Num(n) => n.to_string(),
            })
    })?;

    // Cosine collections report similarity
    Some(IndexHit::new(scheme_id, 1.0 - point.score))
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn query(&self, embedding: &[f32], n: usize) -> scheme_saathi_core::Result<Vec<IndexHit>> {
        if embedding.len() != self.config.vector_dim {
            return Err(RagError::Index(format!(
                "Query has {} dims, collection expects {}",
                embedding.len(),
                self.config.vector_dim
            ))
            .into());
        }

        let search = SearchPointsBuilder::new(&self.config.collection, embedding.to_vec(), n as u64)
            .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let hits: Vec<IndexHit> = results
            .result
            .into_iter()
            .filter_map(hit_from_point)
            .collect();

        tracing::debug!(
            collection = %self.config.collection,
            requested = n,
            returned = hits.len(),
            "Qdrant search complete"
        );
        Ok(hits)
    }

    async fn len(&self) -> scheme_saathi_core::Result<usize> {
        Ok(self.points_count().await? as usize)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{PointId, Value};
    use std::collections::HashMap;

    #[test]
    fn test_config_from_settings() {
        let rag = RagConfig {
            collection: "schemes_v2".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let config = QdrantIndexConfig::from_settings(&rag, 768);
        assert_eq!(config.collection, "schemes_v2");
        assert_eq!(config.vector_dim, 768);
        assert_eq!(config.endpoint, "http://127.0.0.1:6334");
    }

    #[test]
    fn test_hit_from_payload() {
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert(SCHEME_ID_KEY.to_string(), "pm-kisan".to_string().into());
        let point = ScoredPoint {
            id: Some(PointId::from(7u64)),
            payload,
            score: 0.75,
            ..Default::default()
        };

        let hit = hit_from_point(point).unwrap();
        assert_eq!(hit.scheme_id, "pm-kisan");
        assert!((hit.distance - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_hit_falls_back_to_point_id() {
        let point = ScoredPoint {
            id: Some(PointId::from(42u64)),
            score: 0.5,
            ..Default::default()
        };
        assert_eq!(hit_from_point(point).unwrap().scheme_id, "42");

        let orphan = ScoredPoint::default();
        assert!(hit_from_point(orphan).is_none());
    }
}
