//! Need (help type) filter
//!
//! Maps a scheme's benefit onto a need family and drops schemes whose family
//! clearly differs from what the user asked for. Generic cash assistance and
//! unclassifiable schemes are always kept.

use once_cell::sync::Lazy;
use regex::Regex;

use scheme_saathi_core::{CandidateResult, SlotKey, UserContext};

use super::CandidateFilter;

/// Family of schemes that fit any need
const GENERIC_FAMILY: &str = "financial_assistance";

/// Need families served by the same schemes
const COMPATIBLE_NEEDS: &[(&str, &str)] = &[
    ("loan", "business_support"),
    ("loan", "agriculture_support"),
    ("loan", "housing"),
    ("skill_training", "employment"),
];

/// Ordered family rules; the first match wins, the generic family is last
static NEED_FAMILIES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"scholarship|fellowship|stipend|tuition|fee\s+(?:waiver|reimbursement)").unwrap(),
            "scholarship",
        ),
        (
            Regex::new(r"\bloans?\b|\bcredit\b|interest\s+subvention|\bmudra\b").unwrap(),
            "loan",
        ),
        (Regex::new(r"pension").unwrap(), "pension"),
        (
            Regex::new(r"\bcrops?\b|agricultur|\bfarm|\bseeds?\b|fertili[sz]er|irrigation|\bkisan\b|livestock|fisher")
                .unwrap(),
            "agriculture_support",
        ),
        (
            Regex::new(r"health|medical|insurance|hospital|treatment|ayushman").unwrap(),
            "health_insurance",
        ),
        (
            Regex::new(r"housing|\bhouses?\b|\bawas\b|shelter|dwelling").unwrap(),
            "housing",
        ),
        (
            Regex::new(r"marriage|wedding|\bvivah\b|\bshaadi\b").unwrap(),
            "marriage",
        ),
        (
            Regex::new(r"\bskills?\b|training|apprentice|vocational|kaushal").unwrap(),
            "skill_training",
        ),
        (
            Regex::new(r"employment|\bjobs?\b|rozgar|\bwages?\b|placement").unwrap(),
            "employment",
        ),
        (
            Regex::new(r"business|enterprise|entrepreneur|start-?up|\bmsme\b|self[- ]employ").unwrap(),
            "business_support",
        ),
        (
            Regex::new(r"financial\s+(?:assistance|aid|help|support)|\bcash\b|subsidy|subsidi[sz]ed|\bgrant\b|allowance|direct\s+benefit")
                .unwrap(),
            GENERIC_FAMILY,
        ),
    ]
});

/// Need family a piece of text describes, if any
pub fn classify_need(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    if t.trim().is_empty() {
        return None;
    }
    NEED_FAMILIES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&t))
        .map(|(_, family)| *family)
}

fn compatible(a: &str, b: &str) -> bool {
    a == b
        || COMPATIBLE_NEEDS
            .iter()
            .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}

fn family_pattern(family: &str) -> Option<&'static Regex> {
    NEED_FAMILIES
        .iter()
        .find(|(_, f)| *f == family)
        .map(|(pattern, _)| pattern)
}

/// Keeps schemes that plausibly serve the requested need
#[derive(Debug, Clone, Copy, Default)]
pub struct NeedFilter;

impl NeedFilter {
    /// Family of a candidate from its declared benefit type; name and
    /// benefit summary are used only when no benefit type is declared
    pub fn scheme_family(candidate: &CandidateResult) -> Option<&'static str> {
        let scheme = &candidate.scheme;
        let benefits = scheme.benefits.as_ref();

        let benefit_type = benefits.map(|b| b.benefit_type.trim()).unwrap_or("");
        if !benefit_type.is_empty() {
            return classify_need(benefit_type);
        }

        let summary = benefits.map(|b| b.summary.as_str()).unwrap_or("");
        classify_need(&format!("{} {}", scheme.scheme_name, summary))
    }

    /// Whether a candidate serves `need`
    pub fn matches(candidate: &CandidateResult, need: &str) -> bool {
        let need = need.trim().to_lowercase();
        if need == GENERIC_FAMILY {
            return true;
        }
        let Some(need_pattern) = family_pattern(&need) else {
            return true;
        };

        match Self::scheme_family(candidate) {
            None => true,
            Some(GENERIC_FAMILY) => true,
            Some(family) if compatible(family, &need) => true,
            // Name may still mention the need ("Education Loan cum Scholarship")
            Some(_) => need_pattern.is_match(&candidate.scheme.scheme_name.to_lowercase()),
        }
    }
}

impl CandidateFilter for NeedFilter {
    fn name(&self) -> &'static str {
        "need"
    }

    fn keep(&self, candidate: &CandidateResult, ctx: &UserContext) -> bool {
        if !ctx.is_valid(SlotKey::HelpType) {
            return true;
        }
        match ctx.help_type() {
            Some(need) => Self::matches(candidate, need),
            None => true,
        }
    }
}
