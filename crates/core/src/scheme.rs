//! Scheme corpus records
//!
//! Records come from the ingestion pipeline as JSON. The eligibility and
//! benefits sub-records are often missing or malformed there, so both are
//! deserialized leniently: anything that is not a JSON object becomes `None`,
//! which the filters treat as "unconstrained".

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Scheme `state` values meaning the scheme is available everywhere
pub const ALL_INDIA_MARKERS: &[&str] = &["all india", "all states", "national", "central", "nationwide"];

/// Values meaning a scheme leaves a field unconstrained
const UNCONSTRAINED_VALUES: &[&str] = &["", "any", "all", "unknown", "none", "na", "n/a", "not specified"];

/// True when a scheme-side eligibility value does not constrain anything
///
/// Also covers qualified forms such as `"any (higher subsidy for SC/ST)"`.
pub fn is_unconstrained(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    UNCONSTRAINED_VALUES.contains(&v.as_str())
        || v.starts_with("any ")
        || v.starts_with("any(")
        || v.starts_with("all ")
}

/// Structured eligibility metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityCriteria {
    pub state: String,
    pub occupation: String,
    pub gender: String,
    pub caste_category: String,
    pub age_range: String,
    pub income_limit: String,
    pub education: String,
    pub raw_eligibility_text: String,
}

impl EligibilityCriteria {
    /// Whether the scheme's declared state admits `user_state`
    ///
    /// All-India markers and unconstrained values admit everyone; otherwise
    /// either side containing the other counts as a match.
    pub fn covers_state(&self, user_state: &str) -> bool {
        let scheme_state = self.state.trim().to_lowercase();
        if is_unconstrained(&scheme_state)
            || ALL_INDIA_MARKERS.iter().any(|m| scheme_state.contains(m))
        {
            return true;
        }
        let user = user_state.trim().to_lowercase();
        if user.is_empty() {
            return true;
        }
        scheme_state.contains(&user) || user.contains(&scheme_state)
    }
}

/// Benefit metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Benefits {
    pub benefit_type: String,
    pub summary: String,
    pub financial_benefit: String,
    pub raw_benefits_text: String,
}

/// Immutable corpus entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeRecord {
    pub scheme_id: String,
    pub scheme_name: String,
    pub category: String,
    pub brief_description: String,
    pub detailed_description: String,
    #[serde(deserialize_with = "lenient_object")]
    pub eligibility_criteria: Option<EligibilityCriteria>,
    #[serde(deserialize_with = "lenient_object")]
    pub benefits: Option<Benefits>,
    pub source_url: String,
    pub official_website: String,
    pub ministry_department: String,
    pub data_quality_score: f64,
}

impl SchemeRecord {
    /// Name, descriptions and raw eligibility text, lowercased
    pub fn searchable_text(&self) -> String {
        let elig = self
            .eligibility_criteria
            .as_ref()
            .map(|e| e.raw_eligibility_text.as_str())
            .unwrap_or("");
        format!(
            "{} {} {}",
            self.scheme_name, self.brief_description, elig
        )
        .to_lowercase()
    }

    /// Short form for listings and chat cards
    pub fn summary(&self) -> SchemeSummary {
        let eligibility = self
            .eligibility_criteria
            .as_ref()
            .map(|e| e.raw_eligibility_text.clone())
            .unwrap_or_default();
        let benefits = self
            .benefits
            .as_ref()
            .map(|b| {
                if b.summary.is_empty() {
                    b.raw_benefits_text.clone()
                } else {
                    b.summary.clone()
                }
            })
            .unwrap_or_default();

        SchemeSummary {
            scheme_id: self.scheme_id.clone(),
            scheme_name: self.scheme_name.clone(),
            category: self.category.clone(),
            brief_description: truncate_chars(&self.brief_description, 500),
            eligibility_summary: non_empty(truncate_chars(&eligibility, 300)),
            benefits_summary: non_empty(truncate_chars(&benefits, 300)),
        }
    }
}

/// Condensed scheme view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub scheme_id: String,
    pub scheme_name: String,
    pub category: String,
    pub brief_description: String,
    pub eligibility_summary: Option<String>,
    pub benefits_summary: Option<String>,
}

/// A scheme annotated with its semantic match score in `[0, 1]`
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResult {
    #[serde(flatten)]
    pub scheme: Arc<SchemeRecord>,
    pub match_score: f32,
}

impl CandidateResult {
    pub fn new(scheme: Arc<SchemeRecord>, match_score: f32) -> Self {
        Self {
            scheme,
            match_score: match_score.clamp(0.0, 1.0),
        }
    }

    pub fn scheme_id(&self) -> &str {
        &self.scheme.scheme_id
    }
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::debug!(error = %e, "Treating malformed scheme metadata as unconstrained");
            Ok(None)
        },
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
