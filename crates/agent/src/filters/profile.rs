//! Content rules over scheme text
//!
//! Many schemes carry no structured education or disability metadata, so
//! these rules read the scheme name, brief description and raw eligibility
//! text instead.

use once_cell::sync::Lazy;
use regex::Regex;

use scheme_saathi_core::{CandidateResult, SlotKey, UserContext};

use super::{scheme_text, CandidateFilter};

static PRE_MATRIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpre[- ]?matric").unwrap());

static SCHOOL_CLASSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass(?:es)?\s+(?:[1-9]|10)\b").unwrap());

static BEYOND_SCHOOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bclass\s*1[1-2]\b|\bpost[- ]?matric|\bcollege\b|\buniversity\b|\bdegree\b|\bgraduate\b")
        .unwrap()
});

static HIGHER_EDUCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpost[- ]?matric|\bcollege\b|\buniversity\b|\bdegree\b|\bgraduate\b|\bprofessional\s+course\b|\bengineering\b|\bmbbs\b|\bdiploma\b",
    )
    .unwrap()
});

static DISABILITY_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bdisabled\b|\bdisabilit(?:y|ies)\b|\bdivyang(?:jan)?\b|\bhandicapped\b|\bdifferently[- ]abled\b|\bpwds?\b|\bspecially[- ]abled\b",
    )
    .unwrap()
});

/// Whether a scheme targets pre-matric (class 1-10) students only
pub fn is_pre_matric(text: &str) -> bool {
    PRE_MATRIC.is_match(text) || (SCHOOL_CLASSES.is_match(text) && !BEYOND_SCHOOL.is_match(text))
}

/// Whether a scheme targets post-matric or higher education
pub fn is_post_matric(text: &str) -> bool {
    HIGHER_EDUCATION.is_match(text)
}

/// Education level and disability rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileFilter;

impl ProfileFilter {
    fn education_ok(text: &str, ctx: &UserContext) -> bool {
        match ctx.get_lower(SlotKey::EducationLevel).as_deref() {
            Some("higher") => !is_pre_matric(text),
            Some("school") => !is_post_matric(text),
            _ => true,
        }
    }

    /// Disability-targeted schemes are dropped only after an explicit "no"
    fn disability_ok(candidate: &CandidateResult, ctx: &UserContext) -> bool {
        if !matches!(ctx.get_lower(SlotKey::Disability).as_deref(), Some("no" | "false" | "n")) {
            return true;
        }
        let scheme = &candidate.scheme;
        let target = format!("{} {}", scheme.scheme_name, scheme.brief_description).to_lowercase();
        !DISABILITY_TARGET.is_match(&target)
    }
}

impl CandidateFilter for ProfileFilter {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn keep(&self, candidate: &CandidateResult, ctx: &UserContext) -> bool {
        if ctx.is_empty() {
            return true;
        }
        Self::education_ok(&scheme_text(candidate), ctx) && Self::disability_ok(candidate, ctx)
    }
}
