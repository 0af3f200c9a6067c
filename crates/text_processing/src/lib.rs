//! Text processing for the scheme recommendation engine
//!
//! This crate turns free-text user messages into typed eligibility slots:
//! - **Slot Extraction**: ordered regex rule tables per slot (occupation,
//!   state, gender, age, caste category, help type, disability, BPL status,
//!   education level), with negation-aware matching
//! - **Canonical Phrases**: one English phrasing per slot value that
//!   extraction maps back to the same value
//!
//! # Example
//!
//! ```
//! use scheme_saathi_core::SlotKey;
//! use scheme_saathi_text_processing::SlotExtractor;
//!
//! let extractor = SlotExtractor::new();
//! let ctx = extractor.extract("I am a farmer from Bihar and need a loan");
//! assert_eq!(ctx.get(SlotKey::Occupation), Some("farmer"));
//! assert_eq!(ctx.get(SlotKey::State), Some("Bihar"));
//! assert_eq!(ctx.help_type(), Some("loan"));
//! ```

pub mod slot_extraction;

mod error;

pub use error::{Result, TextProcessingError};
pub use slot_extraction::{canonical_phrase, SlotExtraction, SlotExtractionConfig, SlotExtractor};
