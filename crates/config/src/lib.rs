//! Configuration management for the scheme recommendation engine
//!
//! Settings are layered from:
//! - `config/default` (any format the `config` crate understands)
//! - `config/{env}` for the selected runtime environment
//! - Environment variables (`SCHEME_SAATHI__SECTION__FIELD`)

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, CorpusConfig, EmbeddingConfig, EmbeddingProvider, ExtractionConfig,
    HttpEmbeddingApi, IndexBackend, ObservabilityConfig, RagConfig, RecommendationConfig,
    RuntimeEnvironment, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
