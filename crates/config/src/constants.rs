//! Default values shared across crates
//!
//! Settings defaults, the retriever and the recommender all read from here so
//! that a tuning change lands in one place.

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Ollama embedding endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// Qdrant vector store endpoint
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6334";
}

/// Semantic retrieval
pub mod rag {
    /// Minimum similarity (`1 - distance`) a candidate must reach
    pub const SIMILARITY_THRESHOLD: f32 = 0.3;

    /// Neighbours fetched per requested result
    pub const POOL_MULTIPLIER: usize = 3;

    /// Hard cap on the neighbour pool
    pub const POOL_CAP: usize = 30;

    /// Upper bound on a single retrieval call
    pub const TIMEOUT_MS: u64 = 5_000;

    pub const DEFAULT_COLLECTION: &str = "schemes";
}

/// Embedding models
pub mod embedding {
    /// all-MiniLM-L6-v2 output dimension
    pub const DEFAULT_DIM: usize = 384;

    pub const DEFAULT_MODEL: &str = "all-minilm";

    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
}

/// Recommendation flow
pub mod recommendation {
    /// Candidates returned by a recommendation call
    pub const DEFAULT_TOP_K: usize = 20;

    /// Candidates shown to the user
    pub const DISPLAY_TOP_K: usize = 7;

    /// Retrieved candidates per final slot, leaving headroom for filtering
    pub const CANDIDATE_MULTIPLIER: usize = 2;

    /// Messages kept in a conversation's history buffer
    pub const HISTORY_WINDOW: usize = 20;

    /// Recent user turns folded into the search text
    pub const RECENT_TURNS: usize = 4;
}

/// Corpus loading
pub mod corpus {
    pub const DEFAULT_SCHEMES_PATH: &str = "data/all_schemes.json";

    /// Schemes scoring below this data quality are not loaded (0 disables)
    pub const MIN_QUALITY_SCORE: f64 = 30.0;
}
