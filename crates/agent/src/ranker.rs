//! Final ordering of filtered candidates

use scheme_saathi_core::CandidateResult;

/// Orders candidates by match score and keeps the best `top_k`
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    top_k: usize,
}

impl Ranker {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Stable descending sort, so equal scores keep retrieval order
    pub fn rank(&self, mut candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
        candidates.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        candidates.truncate(self.top_k);
        candidates
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(scheme_saathi_config::constants::recommendation::DEFAULT_TOP_K)
    }
}
