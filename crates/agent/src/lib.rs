//! Scheme recommendation agent
//!
//! Features:
//! - Context accumulation across turns, with retraction of denied values
//! - Readiness gate choosing the next question to ask
//! - Semantic retrieval followed by eligibility, profile and need filters
//! - Score ranking and truncation
//!
//! # Example
//!
//! ```no_run
//! use scheme_saathi_agent::Recommender;
//! use scheme_saathi_config::Settings;
//!
//! # async fn run() -> Result<(), scheme_saathi_agent::AgentError> {
//! let recommender = Recommender::from_settings(&Settings::default()).await?;
//! let mut state = recommender.new_conversation();
//! let rec = recommender
//!     .recommend_turn(&mut state, "I'm a female SC student from Karnataka looking for scholarships", None)
//!     .await;
//! assert!(rec.ready);
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod filters;
pub mod ranker;
pub mod readiness;
pub mod recommender;

pub use accumulator::{recent_user_messages, ContextAccumulator, ConversationState};
pub use filters::{
    apply_all, default_filters, AgeRange, CandidateFilter, EligibilityFilter, NeedFilter,
    ProfileFilter,
};
pub use ranker::Ranker;
pub use readiness::{ReadinessDecision, ReadinessGate};
pub use recommender::{Recommendation, Recommender, RecommenderConfig};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Retrieval error: {0}")]
    Rag(#[from] scheme_saathi_rag::RagError),

    #[error("Text processing error: {0}")]
    TextProcessing(#[from] scheme_saathi_text_processing::TextProcessingError),
}

impl From<scheme_saathi_config::ConfigError> for AgentError {
    fn from(err: scheme_saathi_config::ConfigError) -> Self {
        AgentError::Config(err.to_string())
    }
}

impl From<AgentError> for scheme_saathi_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Config(msg) => scheme_saathi_core::Error::Config(msg),
            AgentError::Rag(e) => e.into(),
            AgentError::TextProcessing(e) => e.into(),
        }
    }
}
