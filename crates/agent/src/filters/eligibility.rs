//! Structured eligibility filter
//!
//! Compares the user context against a scheme's `eligibility_criteria`
//! fields: state, occupation, gender, caste category and age range.
//! Unconstrained or missing scheme fields always pass.

use once_cell::sync::Lazy;
use regex::Regex;

use scheme_saathi_core::scheme::is_unconstrained;
use scheme_saathi_core::{CandidateResult, EligibilityCriteria, SlotKey, UserContext};

use super::CandidateFilter;

/// Occupations a scheme can name that exclude a user of the given occupation
const OCCUPATION_MISMATCHES: &[(&str, &[&str])] = &[
    ("farmer", &["student", "entrepreneur", "employee"]),
    ("student", &["farmer", "senior citizen"]),
    ("senior citizen", &["student", "farmer", "entrepreneur"]),
    ("entrepreneur", &["student", "farmer"]),
];

const GENERAL_CASTES: &[&str] = &["any", "all", "general", ""];

const FEMALE_TERMS: &[&str] = &["female", "females", "women", "woman", "girl", "girls", "widow", "widows"];
const MALE_TERMS: &[&str] = &["male", "males", "men", "man", "boy", "boys"];

static CASTE_ALIASES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"scheduled\s+castes?").unwrap(), "sc"),
        (Regex::new(r"scheduled\s+tribes?").unwrap(), "st"),
        (Regex::new(r"other\s+backward\s+class(?:es)?").unwrap(), "obc"),
        (Regex::new(r"economically\s+weaker\s+sections?").unwrap(), "ews"),
        (Regex::new(r"\bminorities\b").unwrap(), "minority"),
    ]
});

static AGE_BETWEEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})\s*(?:-|–|to|and)\s*(\d{1,3})").unwrap());
static AGE_PLUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,3})\s*\+").unwrap());
static AGE_NOT_BELOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"not\s+(?:less|fewer|younger)\s+than\s*(\d{1,3})|not\s+(?:below|under)\s*(\d{1,3})")
        .unwrap()
});
static AGE_NOT_ABOVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"not\s+(?:more|greater|older)\s+than\s*(\d{1,3})|not\s+(?:above|over|exceeding)\s*(\d{1,3})")
        .unwrap()
});
static AGE_MIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:above|over|more than|at least|minimum|min\.?|>=?)\s*(\d{1,3})").unwrap()
});
static AGE_MAX_EXCLUSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:below|under|less than|<)\s*(\d{1,3})").unwrap());
static AGE_MAX_INCLUSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:up\s*to|maximum|max\.?|<=)\s*(\d{1,3})").unwrap());

/// Inclusive age bounds parsed from free-form scheme text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl AgeRange {
    /// Parse forms such as `18-40`, `18 to 40 years`, `60+`, `above 60`,
    /// `below 18`, `<10`, `up to 35`, `not more than 35`, `not less than 18`
    pub fn parse(text: &str) -> Option<Self> {
        let t = text.trim().to_lowercase();
        if t.is_empty() {
            return None;
        }

        if let Some(caps) = AGE_BETWEEN.captures(&t) {
            if let (Some(a), Some(b)) = (capture_u32(&caps, 1), capture_u32(&caps, 2)) {
                return Some(Self {
                    min: Some(a.min(b)),
                    max: Some(a.max(b)),
                });
            }
        }
        if let Some(min) = AGE_PLUS.captures(&t).and_then(|c| capture_u32(&c, 1)) {
            return Some(Self { min: Some(min), max: None });
        }

        // Negated bounds first; their inner "more than"/"less than" would flip them
        let not_below = first_number(&AGE_NOT_BELOW, &t);
        let not_above = first_number(&AGE_NOT_ABOVE, &t);
        let rest = AGE_NOT_BELOW.replace_all(&t, " ");
        let rest = AGE_NOT_ABOVE.replace_all(&rest, " ");

        let min = not_below.or_else(|| first_number(&AGE_MIN, &rest));
        let max = not_above
            .or_else(|| first_number(&AGE_MAX_INCLUSIVE, &rest))
            .or_else(|| first_number(&AGE_MAX_EXCLUSIVE, &rest).map(|n| n.saturating_sub(1)));

        if min.is_none() && max.is_none() {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn contains(&self, age: u32) -> bool {
        self.min.map_or(true, |min| age >= min) && self.max.map_or(true, |max| age <= max)
    }
}

/// Rejects schemes whose declared eligibility contradicts the user
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter;

impl EligibilityFilter {
    fn state_ok(criteria: &EligibilityCriteria, ctx: &UserContext) -> bool {
        match ctx.get(SlotKey::State) {
            Some(state) if ctx.is_valid(SlotKey::State) => criteria.covers_state(state),
            _ => true,
        }
    }

    fn occupation_ok(criteria: &EligibilityCriteria, ctx: &UserContext) -> bool {
        let scheme_occupation = criteria.occupation.trim().to_lowercase();
        if is_unconstrained(&scheme_occupation) || !ctx.is_valid(SlotKey::Occupation) {
            return true;
        }
        let Some(user_occupation) = ctx.get_lower(SlotKey::Occupation) else {
            return true;
        };
        if scheme_occupation.contains(&user_occupation) {
            return true;
        }

        let mismatches = OCCUPATION_MISMATCHES
            .iter()
            .find(|(occupation, _)| *occupation == user_occupation)
            .map(|(_, m)| *m)
            .unwrap_or(&[]);
        !mismatches.iter().any(|m| scheme_occupation.contains(m))
    }

    fn gender_ok(criteria: &EligibilityCriteria, ctx: &UserContext) -> bool {
        let scheme_gender = criteria.gender.trim().to_lowercase();
        if is_unconstrained(&scheme_gender) || !ctx.is_valid(SlotKey::Gender) {
            return true;
        }
        let tokens = tokens(&scheme_gender);
        let mentions = |terms: &[&str]| tokens.iter().any(|t| terms.contains(&t.as_str()));
        let (female, male) = (mentions(FEMALE_TERMS), mentions(MALE_TERMS));

        match ctx.get_lower(SlotKey::Gender).as_deref() {
            Some("male") => !(female && !male),
            Some("female") => !(male && !female),
            _ => true,
        }
    }

    fn caste_ok(criteria: &EligibilityCriteria, ctx: &UserContext) -> bool {
        let scheme_caste = normalize_caste(&criteria.caste_category);
        if is_unconstrained(&scheme_caste)
            || GENERAL_CASTES.contains(&scheme_caste.as_str())
            || !ctx.is_valid(SlotKey::CasteCategory)
        {
            return true;
        }
        let Some(user_caste) = ctx.get(SlotKey::CasteCategory).map(normalize_caste) else {
            return true;
        };

        let scheme_tokens = tokens(&scheme_caste);
        if GENERAL_CASTES.contains(&user_caste.as_str()) {
            return scheme_tokens.iter().any(|t| t == "general");
        }

        let user_tokens = tokens(&user_caste);
        if user_tokens.iter().any(|t| scheme_tokens.contains(t)) {
            return true;
        }
        // Longer names may appear inside descriptive text
        (user_caste.len() > 3 && scheme_caste.contains(&user_caste))
            || (scheme_caste.len() > 3 && user_caste.contains(&scheme_caste))
    }

    fn age_ok(criteria: &EligibilityCriteria, ctx: &UserContext) -> bool {
        let Some(age) = ctx.age_years() else {
            return true;
        };
        if is_unconstrained(&criteria.age_range) {
            return true;
        }
        AgeRange::parse(&criteria.age_range).map_or(true, |range| range.contains(age))
    }
}

impl CandidateFilter for EligibilityFilter {
    fn name(&self) -> &'static str {
        "eligibility"
    }

    fn keep(&self, candidate: &CandidateResult, ctx: &UserContext) -> bool {
        if ctx.is_empty() {
            return true;
        }
        let Some(criteria) = candidate.scheme.eligibility_criteria.as_ref() else {
            return true;
        };

        let keep = Self::state_ok(criteria, ctx)
            && Self::occupation_ok(criteria, ctx)
            && Self::gender_ok(criteria, ctx)
            && Self::caste_ok(criteria, ctx)
            && Self::age_ok(criteria, ctx);

        if !keep {
            tracing::debug!(scheme_id = candidate.scheme_id(), "Scheme fails eligibility");
        }
        keep
    }
}

fn capture_u32(caps: &regex::Captures<'_>, i: usize) -> Option<u32> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

/// Number from the first capture group that participated in the match
fn first_number(pattern: &Regex, text: &str) -> Option<u32> {
    let caps = pattern.captures(text)?;
    (1..caps.len()).find_map(|i| capture_u32(&caps, i))
}

fn normalize_caste(value: &str) -> String {
    let mut v = value.trim().to_lowercase();
    for (pattern, alias) in CASTE_ALIASES.iter() {
        v = pattern.replace_all(&v, *alias).into_owned();
    }
    v
}

fn tokens(value: &str) -> Vec<String> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
