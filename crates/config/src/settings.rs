//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{corpus, embedding, endpoints, rag, recommendation};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, degraded startup allowed
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Strict environments refuse to start without a usable corpus
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub recommendation: RecommendationConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Scheme corpus location and load-time filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSON corpus (object with `schemes`, array, or concatenated objects)
    #[serde(default = "default_schemes_path")]
    pub schemes_path: PathBuf,

    /// Precomputed scheme embeddings for the in-memory index
    #[serde(default)]
    pub embeddings_path: Option<PathBuf>,

    /// Minimum `data_quality_score`; 0 disables the check
    #[serde(default = "default_min_quality")]
    pub min_quality_score: f64,
}

fn default_schemes_path() -> PathBuf {
    PathBuf::from(corpus::DEFAULT_SCHEMES_PATH)
}

fn default_min_quality() -> f64 {
    corpus::MIN_QUALITY_SCORE
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            schemes_path: default_schemes_path(),
            embeddings_path: None,
            min_quality_score: default_min_quality(),
        }
    }
}

/// Vector index backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Brute-force cosine index held in memory
    #[default]
    Memory,
    /// Qdrant collection
    Qdrant,
}

/// Semantic retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub backend: IndexBackend,

    /// Qdrant endpoint
    #[serde(default = "default_qdrant_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Minimum similarity for a candidate to be kept
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Neighbours fetched per requested result
    #[serde(default = "default_pool_multiplier")]
    pub pool_multiplier: usize,

    /// Upper bound on the neighbour pool
    #[serde(default = "default_pool_cap")]
    pub pool_cap: usize,

    #[serde(default = "default_rag_timeout")]
    pub timeout_ms: u64,
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}

fn default_collection() -> String {
    rag::DEFAULT_COLLECTION.to_string()
}

fn default_similarity_threshold() -> f32 {
    rag::SIMILARITY_THRESHOLD
}

fn default_pool_multiplier() -> usize {
    rag::POOL_MULTIPLIER
}

fn default_pool_cap() -> usize {
    rag::POOL_CAP
}

fn default_rag_timeout() -> u64 {
    rag::TIMEOUT_MS
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            endpoint: default_qdrant_endpoint(),
            collection: default_collection(),
            api_key: None,
            similarity_threshold: default_similarity_threshold(),
            pool_multiplier: default_pool_multiplier(),
            pool_cap: default_pool_cap(),
            timeout_ms: default_rag_timeout(),
        }
    }
}

/// Embedding provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing, no model required
    #[default]
    Hash,
    /// Remote embedding endpoint
    Http,
    /// Local ONNX sentence encoder (`onnx` feature)
    Onnx,
}

/// Wire format of the HTTP embedding endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpEmbeddingApi {
    #[default]
    Ollama,
    OpenAi,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default)]
    pub api: HttpEmbeddingApi,

    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Bearer token for OpenAI-compatible endpoints
    #[serde(default)]
    pub api_key: Option<String>,

    /// Vector dimension; must match the index
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,

    /// ONNX model file (`onnx` provider)
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// tokenizer.json next to the ONNX model
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_ms: u64,
}

fn default_embedding_endpoint() -> String {
    endpoints::OLLAMA_DEFAULT.to_string()
}

fn default_embedding_model() -> String {
    embedding::DEFAULT_MODEL.to_string()
}

fn default_embedding_dim() -> usize {
    embedding::DEFAULT_DIM
}

fn default_embedding_timeout() -> u64 {
    embedding::DEFAULT_TIMEOUT_MS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            api: HttpEmbeddingApi::default(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            dim: default_embedding_dim(),
            model_path: None,
            tokenizer_path: None,
            timeout_ms: default_embedding_timeout(),
        }
    }
}

/// Recommendation flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(default = "default_display_top_k")]
    pub display_top_k: usize,

    /// Retrieved candidates per requested result
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Messages retained per conversation
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Recent user turns folded into the search text
    #[serde(default = "default_recent_turns")]
    pub recent_turns: usize,
}

fn default_top_k() -> usize {
    recommendation::DEFAULT_TOP_K
}

fn default_display_top_k() -> usize {
    recommendation::DISPLAY_TOP_K
}

fn default_candidate_multiplier() -> usize {
    recommendation::CANDIDATE_MULTIPLIER
}

fn default_history_window() -> usize {
    recommendation::HISTORY_WINDOW
}

fn default_recent_turns() -> usize {
    recommendation::RECENT_TURNS
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            display_top_k: default_display_top_k(),
            candidate_multiplier: default_candidate_multiplier(),
            history_window: default_history_window(),
            recent_turns: default_recent_turns(),
        }
    }
}

/// Extra slot extraction rules, evaluated before the built-in tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// slot name -> ordered `[pattern, value]` pairs
    #[serde(default)]
    pub custom_patterns: HashMap<String, Vec<(String, String)>>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_rag()?;
        self.validate_embedding()?;
        self.validate_recommendation()?;
        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if !(0.0..=1.0).contains(&rag.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "rag.similarity_threshold".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", rag.similarity_threshold),
            });
        }

        if rag.pool_multiplier == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.pool_multiplier".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rag.pool_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.pool_cap".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rag.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if rag.backend == IndexBackend::Qdrant && rag.collection.trim().is_empty() {
            return Err(ConfigError::MissingField("rag.collection".to_string()));
        }

        Ok(())
    }

    fn validate_embedding(&self) -> Result<(), ConfigError> {
        let emb = &self.embedding;

        if emb.dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dim".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if emb.provider == EmbeddingProvider::Onnx {
            match &emb.model_path {
                None => return Err(ConfigError::MissingField("embedding.model_path".to_string())),
                Some(path) if self.environment.is_strict() && !path.exists() => {
                    return Err(ConfigError::FileNotFound(path.display().to_string()));
                },
                Some(path) if !path.exists() => {
                    tracing::warn!(path = %path.display(), "ONNX embedding model not found");
                },
                Some(_) => {},
            }
        }

        Ok(())
    }

    fn validate_recommendation(&self) -> Result<(), ConfigError> {
        let rec = &self.recommendation;

        if rec.default_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recommendation.default_top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rec.display_top_k == 0 || rec.display_top_k > rec.default_top_k {
            return Err(ConfigError::InvalidValue {
                field: "recommendation.display_top_k".to_string(),
                message: format!(
                    "Must be between 1 and default_top_k ({}), got {}",
                    rec.default_top_k, rec.display_top_k
                ),
            });
        }

        if rec.candidate_multiplier == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recommendation.candidate_multiplier".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rec.history_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recommendation.history_window".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from `config/` under the working directory and the environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (`SCHEME_SAATHI__` prefix)
/// 2. config/{env} (if env specified)
/// 3. config/default
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(config_dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(config_dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(config_dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SCHEME_SAATHI")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        backend = ?settings.rag.backend,
        provider = ?settings.embedding.provider,
        "Loaded settings"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.environment, RuntimeEnvironment::Development);
        assert_eq!(settings.rag.similarity_threshold, 0.3);
        assert_eq!(settings.rag.pool_cap, 30);
        assert_eq!(settings.recommendation.default_top_k, 20);
        assert_eq!(settings.recommendation.display_top_k, 7);
        assert_eq!(settings.corpus.min_quality_score, 30.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_strict_environments() {
        assert!(!RuntimeEnvironment::Development.is_strict());
        assert!(RuntimeEnvironment::Staging.is_strict());
        assert!(RuntimeEnvironment::Production.is_strict());
    }

    #[test]
    fn test_rag_validation_threshold() {
        let mut settings = Settings::default();

        settings.rag.similarity_threshold = 1.5;
        assert!(settings.validate_rag().is_err());

        settings.rag.similarity_threshold = -0.1;
        assert!(settings.validate_rag().is_err());

        settings.rag.similarity_threshold = 0.5;
        assert!(settings.validate_rag().is_ok());
    }

    #[test]
    fn test_rag_validation_pool() {
        let mut settings = Settings::default();

        settings.rag.pool_cap = 0;
        assert!(settings.validate_rag().is_err());
        settings.rag.pool_cap = 30;

        settings.rag.pool_multiplier = 0;
        assert!(settings.validate_rag().is_err());
    }

    #[test]
    fn test_recommendation_validation() {
        let mut settings = Settings::default();

        settings.recommendation.display_top_k = 25;
        assert!(settings.validate_recommendation().is_err());

        settings.recommendation.display_top_k = 7;
        settings.recommendation.default_top_k = 0;
        assert!(settings.validate_recommendation().is_err());
    }

    #[test]
    fn test_onnx_requires_model_path() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::Onnx;
        assert!(settings.validate_embedding().is_err());

        settings.embedding.model_path = Some(PathBuf::from("/nonexistent/model.onnx"));
        assert!(settings.validate_embedding().is_ok());

        settings.environment = RuntimeEnvironment::Production;
        assert!(matches!(
            settings.validate_embedding(),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[rag]\nsimilarity_threshold = 0.4\n\n[recommendation]\ndisplay_top_k = 5\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            "environment = \"staging\"\n\n[rag]\nbackend = \"qdrant\"\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.environment, RuntimeEnvironment::Staging);
        assert_eq!(settings.rag.backend, IndexBackend::Qdrant);
        assert_eq!(settings.rag.similarity_threshold, 0.4);
        assert_eq!(settings.recommendation.display_top_k, 5);
        assert_eq!(settings.recommendation.default_top_k, 20);
    }

    #[test]
    fn test_custom_extraction_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[extraction.custom_patterns]\noccupation = [[\"\\\\bweaver\\\\b\", \"artisan\"]]\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        let rules = &settings.extraction.custom_patterns["occupation"];
        assert_eq!(rules[0], ("\\bweaver\\b".to_string(), "artisan".to_string()));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[rag]\npool_cap = 0\n").unwrap();
        assert!(matches!(
            load_settings_from(dir.path(), None),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
