//! Post-retrieval candidate filters
//!
//! Retrieval is semantic only; these filters apply the hard constraints the
//! user has stated. Every filter is permissive: a scheme is dropped only when
//! its metadata positively contradicts the user context.
//!
//! Filters run in order: eligibility, profile, need.

mod eligibility;
mod need;
mod profile;

pub use eligibility::{AgeRange, EligibilityFilter};
pub use need::{classify_need, NeedFilter};
pub use profile::ProfileFilter;

use metrics::counter;

use scheme_saathi_core::{CandidateResult, UserContext};

/// A keep/drop rule over retrieved candidates
pub trait CandidateFilter: Send + Sync {
    /// Filter name used in logs and metric labels
    fn name(&self) -> &'static str;

    /// Whether `candidate` survives for this user
    fn keep(&self, candidate: &CandidateResult, ctx: &UserContext) -> bool;

    /// Apply to a candidate list, preserving order
    fn apply(&self, candidates: Vec<CandidateResult>, ctx: &UserContext) -> Vec<CandidateResult> {
        let before = candidates.len();
        let kept: Vec<CandidateResult> = candidates
            .into_iter()
            .filter(|c| self.keep(c, ctx))
            .collect();

        let removed = before - kept.len();
        if removed > 0 {
            tracing::info!(
                filter = self.name(),
                removed,
                remaining = kept.len(),
                "Filtered candidates"
            );
            counter!("scheme_candidates_filtered_total", "filter" => self.name())
                .increment(removed as u64);
        }
        kept
    }
}

/// The standard chain in application order
pub fn default_filters() -> Vec<Box<dyn CandidateFilter>> {
    vec![
        Box::new(EligibilityFilter),
        Box::new(ProfileFilter),
        Box::new(NeedFilter),
    ]
}

/// Run every filter in turn
pub fn apply_all(
    filters: &[Box<dyn CandidateFilter>],
    mut candidates: Vec<CandidateResult>,
    ctx: &UserContext,
) -> Vec<CandidateResult> {
    for filter in filters {
        if candidates.is_empty() {
            break;
        }
        candidates = filter.apply(candidates, ctx);
    }
    candidates
}

/// Lowercased name, brief description and raw eligibility text
pub(crate) fn scheme_text(candidate: &CandidateResult) -> String {
    candidate.scheme.searchable_text()
}

#[cfg(test)]
pub(crate) mod test_support {
    use scheme_saathi_core::{Benefits, CandidateResult, EligibilityCriteria, SchemeRecord};
    use std::sync::Arc;

    pub fn candidate(id: &str, name: &str, eligibility: Option<EligibilityCriteria>) -> CandidateResult {
        CandidateResult::new(
            Arc::new(SchemeRecord {
                scheme_id: id.to_string(),
                scheme_name: name.to_string(),
                eligibility_criteria: eligibility,
                ..Default::default()
            }),
            0.8,
        )
    }

    pub fn with_benefit(id: &str, name: &str, benefit_type: &str) -> CandidateResult {
        CandidateResult::new(
            Arc::new(SchemeRecord {
                scheme_id: id.to_string(),
                scheme_name: name.to_string(),
                benefits: Some(Benefits {
                    benefit_type: benefit_type.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            0.8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::candidate;
    use super::*;
    use scheme_saathi_core::{EligibilityCriteria, SlotKey};

    #[test]
    fn test_chain_preserves_order() {
        let ctx = UserContext::new()
            .with(SlotKey::State, "Bihar")
            .with(SlotKey::Occupation, "farmer");
        let candidates = vec![
            candidate("a", "Bihar Crop Support", None),
            candidate(
                "b",
                "Kerala Fisheries",
                Some(EligibilityCriteria {
                    state: "Kerala".to_string(),
                    ..Default::default()
                }),
            ),
            candidate("c", "National Credit Scheme", None),
        ];

        let kept = apply_all(&default_filters(), candidates, &ctx);
        let ids: Vec<&str> = kept.iter().map(|c| c.scheme_id()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_empty_context_keeps_everything() {
        let candidates = vec![
            candidate("a", "Pre-Matric Scholarship", None),
            candidate("b", "Scheme for Persons with Disabilities", None),
        ];
        let kept = apply_all(&default_filters(), candidates, &UserContext::new());
        assert_eq!(kept.len(), 2);
    }
}
