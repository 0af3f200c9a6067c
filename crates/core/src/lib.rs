//! Core traits and types for the scheme recommendation engine
//!
//! This crate provides foundational types used across all other crates:
//! - User context (typed eligibility slots with sentinel handling)
//! - Scheme corpus records and scored candidates
//! - Conversation message types
//! - Retrieval traits for pluggable corpus, vector index and embedder backends
//! - Error types

pub mod context;
pub mod conversation;
pub mod error;
pub mod scheme;
pub mod traits;

pub use context::{is_valid_value, SlotKey, UserContext, SENTINEL_VALUES};
pub use conversation::{ChatMessage, Role};
pub use error::{Error, Result};
pub use scheme::{
    Benefits, CandidateResult, EligibilityCriteria, SchemeRecord, SchemeSummary,
    ALL_INDIA_MARKERS,
};
pub use traits::{CorpusProvider, IndexHit, TextEmbedder, VectorIndex};
