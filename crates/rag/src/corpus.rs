//! Scheme corpus loading and catalogue queries
//!
//! The ingestion pipeline writes `all_schemes.json` in one of three shapes:
//! a single `{"metadata": .., "schemes": [..]}` object, a bare array of
//! schemes, or several such objects concatenated (one per category). All
//! three are accepted. Individual schemes that fail to deserialize are
//! skipped with a warning instead of failing the whole load.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use scheme_saathi_core::{CorpusProvider, SchemeRecord, SchemeSummary};

use crate::RagError;

/// Raw eligibility texts that carry no information
const PLACEHOLDER_ELIGIBILITY: &[&str] = &[
    "Check Eligibility",
    "Eligibility criteria not clearly specified",
];

/// Loaded scheme corpus, immutable after construction
#[derive(Debug, Clone, Default)]
pub struct SchemeCorpus {
    schemes: Vec<Arc<SchemeRecord>>,
    by_id: HashMap<String, usize>,
}

/// Corpus statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total: usize,
    pub categories: BTreeMap<String, usize>,
    pub states: BTreeMap<String, usize>,
    pub avg_quality: f64,
    /// Schemes scoring 70 or above
    pub high_quality: usize,
    /// Schemes scoring 50 to 69
    pub medium_quality: usize,
    /// Schemes scoring below 50
    pub low_quality: usize,
}

impl SchemeCorpus {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the corpus file, dropping schemes below `min_quality`
    pub fn load(path: &Path, min_quality: f64) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(RagError::NotFound(format!(
                "Schemes file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| RagError::Corpus(format!("Failed to read {}: {}", path.display(), e)))?;

        let corpus = Self::parse(&content, min_quality);
        tracing::info!(
            path = %path.display(),
            schemes = corpus.len(),
            min_quality,
            "Loaded scheme corpus"
        );
        Ok(corpus)
    }

    /// Parse corpus JSON text; never fails, malformed parts are skipped
    pub fn parse(content: &str, min_quality: f64) -> Self {
        let raw = collect_raw_schemes(content);
        let total = raw.len();

        let mut records = Vec::with_capacity(total);
        let mut low_quality = 0usize;
        for (position, mut value) in raw.into_iter().enumerate() {
            strip_nulls(&mut value);
            match serde_json::from_value::<SchemeRecord>(value) {
                Ok(record) => {
                    if min_quality > 0.0 && record.data_quality_score < min_quality {
                        low_quality += 1;
                        continue;
                    }
                    records.push(record);
                },
                Err(e) => {
                    tracing::warn!(position, error = %e, "Skipping malformed scheme");
                },
            }
        }

        if low_quality > 0 {
            tracing::warn!(
                filtered = low_quality,
                min_quality,
                "Filtered out low-quality schemes"
            );
        }
        if total == 0 {
            tracing::warn!("No schemes found in corpus JSON");
        }

        Self::from_records(records)
    }

    /// Build from already-parsed records; empty and duplicate ids are skipped
    pub fn from_records(records: impl IntoIterator<Item = SchemeRecord>) -> Self {
        let mut schemes = Vec::new();
        let mut by_id = HashMap::new();

        for record in records {
            let id = record.scheme_id.trim().to_string();
            if id.is_empty() {
                tracing::warn!(name = %record.scheme_name, "Skipping scheme without id");
                continue;
            }
            if by_id.contains_key(&id) {
                tracing::debug!(scheme_id = %id, "Skipping duplicate scheme id");
                continue;
            }
            by_id.insert(id, schemes.len());
            schemes.push(Arc::new(record));
        }

        Self { schemes, by_id }
    }

    pub fn get(&self, scheme_id: &str) -> Option<&Arc<SchemeRecord>> {
        self.by_id.get(scheme_id).map(|&i| &self.schemes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SchemeRecord>> {
        self.schemes.iter()
    }

    /// Sorted, de-duplicated non-empty categories
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .schemes
            .iter()
            .map(|s| s.category.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Schemes in `category` (case-insensitive) available in `state`
    ///
    /// Either filter may be omitted. Schemes without eligibility metadata are
    /// available everywhere.
    pub fn filter_schemes(
        &self,
        category: Option<&str>,
        state: Option<&str>,
    ) -> Vec<Arc<SchemeRecord>> {
        let category = category.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty());
        let state = state.map(str::trim).filter(|s| !s.is_empty());

        self.schemes
            .iter()
            .filter(|s| {
                category
                    .as_deref()
                    .map_or(true, |c| s.category.trim().to_lowercase() == c)
            })
            .filter(|s| match (state, s.eligibility_criteria.as_ref()) {
                (Some(state), Some(elig)) => elig.covers_state(state),
                _ => true,
            })
            .cloned()
            .collect()
    }

    pub fn summary(&self, scheme_id: &str) -> Option<SchemeSummary> {
        self.get(scheme_id).map(|s| s.summary())
    }

    pub fn stats(&self) -> CorpusStats {
        let mut stats = CorpusStats {
            total: self.schemes.len(),
            ..Default::default()
        };
        if self.schemes.is_empty() {
            return stats;
        }

        let mut quality_sum = 0.0;
        for scheme in &self.schemes {
            let category = if scheme.category.trim().is_empty() {
                "Unknown"
            } else {
                scheme.category.trim()
            };
            *stats.categories.entry(category.to_string()).or_default() += 1;

            let state = scheme
                .eligibility_criteria
                .as_ref()
                .map(|e| e.state.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or("All India");
            *stats.states.entry(state.to_string()).or_default() += 1;

            let q = scheme.data_quality_score;
            quality_sum += q;
            if q >= 70.0 {
                stats.high_quality += 1;
            } else if q >= 50.0 {
                stats.medium_quality += 1;
            } else {
                stats.low_quality += 1;
            }
        }

        let avg = quality_sum / self.schemes.len() as f64;
        stats.avg_quality = (avg * 100.0).round() / 100.0;
        stats
    }
}

impl CorpusProvider for SchemeCorpus {
    fn get_all_schemes(&self) -> &[Arc<SchemeRecord>] {
        &self.schemes
    }

    fn get_by_id(&self, scheme_id: &str) -> Option<Arc<SchemeRecord>> {
        self.get(scheme_id).cloned()
    }
}

/// Text a scheme is embedded as: labelled fields joined with ` | `
pub fn embedding_text(scheme: &SchemeRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !scheme.scheme_name.is_empty() {
        parts.push(format!("Scheme: {}", scheme.scheme_name));
    }
    if !scheme.category.is_empty() {
        parts.push(format!("Category: {}", scheme.category));
    }

    let brief = scheme.brief_description.as_str();
    if brief.chars().count() > 50 {
        parts.push(format!("Description: {}", brief));
    }
    let detailed = scheme.detailed_description.as_str();
    if !detailed.is_empty() && detailed.chars().count() > brief.chars().count() {
        parts.push(format!("Details: {}", detailed));
    }

    if let Some(benefits) = &scheme.benefits {
        if !benefits.summary.is_empty() {
            parts.push(format!("Benefits: {}", benefits.summary));
        }
        if !benefits.financial_benefit.is_empty() {
            parts.push(format!("Financial Benefit: {}", benefits.financial_benefit));
        }
    }

    if let Some(elig) = &scheme.eligibility_criteria {
        let raw = elig.raw_eligibility_text.trim();
        if !raw.is_empty() && !PLACEHOLDER_ELIGIBILITY.contains(&raw) {
            parts.push(format!("Eligibility: {}", raw));
        }
        let fields = [
            ("Occupation", &elig.occupation),
            ("State", &elig.state),
            ("Caste Category", &elig.caste_category),
            ("Income Limit", &elig.income_limit),
            ("Age Range", &elig.age_range),
        ];
        for (label, value) in fields {
            let v = value.trim();
            if !v.is_empty() && !matches!(v.to_lowercase().as_str(), "any" | "unknown") {
                parts.push(format!("{}: {}", label, v));
            }
        }
    }

    if !scheme.ministry_department.is_empty() {
        parts.push(format!("Ministry: {}", scheme.ministry_department));
    }

    parts.join(" | ")
}

/// Flatten the supported top-level shapes into raw scheme values
fn collect_raw_schemes(content: &str) -> Vec<Value> {
    let mut raw = Vec::new();
    let stream = serde_json::Deserializer::from_str(content).into_iter::<Value>();

    for (block, item) in stream.enumerate() {
        let value = match item {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    block,
                    line = e.line(),
                    column = e.column(),
                    error = %e,
                    "Stopping at malformed JSON block"
                );
                break;
            },
        };

        match value {
            Value::Array(items) => raw.extend(items.into_iter().filter(Value::is_object)),
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.remove("schemes") {
                    raw.extend(items.into_iter().filter(Value::is_object));
                } else if map.contains_key("scheme_id") {
                    raw.push(Value::Object(map));
                } else {
                    tracing::debug!(block, "Ignoring JSON block without schemes");
                }
            },
            _ => tracing::debug!(block, "Ignoring non-object JSON block"),
        }
    }

    raw
}

/// Nulls become absent fields so `#[serde(default)]` applies
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        },
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {},
    }
}
