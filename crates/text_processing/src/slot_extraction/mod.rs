//! Eligibility Slot Extraction
//!
//! Rule-based extraction of eligibility slots (occupation, state, gender, age,
//! caste category, help type, disability, BPL status, education level) from
//! free-text user messages. Supports English plus common Hindi/Hinglish words.
//!
//! ## Rule tables
//!
//! Each slot has an ordered rule table (see `patterns`). Tables are static and
//! compiled once using `once_cell::sync::Lazy`. Custom rules loaded through
//! `SlotExtractor::from_config()` are evaluated ahead of the static ones.
//!
//! ## Negation
//!
//! A match directly preceded by a negation cue ("not", "no", "I'm not a") is
//! skipped, so a later rule can still supply the value. Skipped values are
//! reported as retractions for the caller to withdraw from accumulated context.

mod patterns;

use regex::Regex;
use std::collections::HashMap;

use scheme_saathi_core::{SlotKey, UserContext};

use crate::{Result, TextProcessingError};
use patterns::{
    AGE_PATTERNS, BPL_RULES, CASTE_RULES, DISABILITY_RULES, EDUCATION_RULES, GENDER_RULES,
    HELP_TYPE_RULES, NEGATION_CUE, OCCUPATION_RULES, STATE_RULES,
};

/// Youngest and oldest ages accepted from free text
const MIN_AGE: u32 = 5;
const MAX_AGE: u32 = 100;

/// Slots whose explicit denial is recorded as `"no"`
const YES_NO_SLOTS: [SlotKey; 2] = [SlotKey::Disability, SlotKey::Bpl];

/// Custom extraction rules, keyed by slot name
#[derive(Debug, Clone, Default)]
pub struct SlotExtractionConfig {
    /// slot name -> ordered (pattern, value) pairs
    pub custom_patterns: HashMap<String, Vec<(String, String)>>,
}

/// Result of analysing one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotExtraction {
    /// Slots the message asserts
    pub context: UserContext,
    /// Values the message explicitly denies ("I'm not SC")
    pub retracted: Vec<(SlotKey, String)>,
}

impl SlotExtraction {
    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.retracted.is_empty()
    }
}

/// Outcome of evaluating one slot's rule table
#[derive(Debug, Default)]
struct RuleMatch {
    value: Option<String>,
    negated: Vec<String>,
}

/// Eligibility slot extractor
///
/// Stateless apart from custom rules, so one instance can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct SlotExtractor {
    custom_rules: HashMap<SlotKey, Vec<(Regex, String)>>,
}

impl SlotExtractor {
    /// Create an extractor using only the built-in rule tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with additional rules from configuration
    pub fn from_config(config: SlotExtractionConfig) -> Result<Self> {
        let mut custom_rules: HashMap<SlotKey, Vec<(Regex, String)>> = HashMap::new();

        for (slot_name, rules) in config.custom_patterns {
            let slot: SlotKey = slot_name
                .parse()
                .map_err(|_| TextProcessingError::UnknownSlot(slot_name.clone()))?;
            if slot == SlotKey::Age {
                tracing::warn!(slot = %slot, "Custom rules are not supported for age, ignoring");
                continue;
            }

            let compiled = custom_rules.entry(slot).or_default();
            for (pattern, value) in rules {
                let regex = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                    TextProcessingError::InvalidPattern {
                        slot: slot.to_string(),
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    }
                })?;
                compiled.push((regex, value));
            }
        }

        tracing::debug!(slots = custom_rules.len(), "Loaded custom extraction rules");
        Ok(Self { custom_rules })
    }

    /// Extract all asserted slots from a message
    pub fn extract(&self, text: &str) -> UserContext {
        self.analyze(text).context
    }

    /// Extract asserted slots plus explicitly retracted values
    pub fn analyze(&self, text: &str) -> SlotExtraction {
        let normalized = normalize(text);
        let mut result = SlotExtraction::default();
        if normalized.trim().is_empty() {
            return result;
        }

        let tables: [(SlotKey, &[(Regex, &'static str)]); 8] = [
            (SlotKey::State, STATE_RULES.as_slice()),
            (SlotKey::Occupation, OCCUPATION_RULES.as_slice()),
            (SlotKey::Gender, GENDER_RULES.as_slice()),
            (SlotKey::CasteCategory, CASTE_RULES.as_slice()),
            (SlotKey::HelpType, HELP_TYPE_RULES.as_slice()),
            (SlotKey::EducationLevel, EDUCATION_RULES.as_slice()),
            (SlotKey::Disability, DISABILITY_RULES.as_slice()),
            (SlotKey::Bpl, BPL_RULES.as_slice()),
        ];

        for (slot, table) in tables {
            let matched = self.match_slot(slot, table, &normalized);
            if let Some(value) = matched.value {
                result.context.set(slot, value);
            } else if YES_NO_SLOTS.contains(&slot) && !matched.negated.is_empty() {
                result.context.set(slot, "no");
            }
            for value in matched.negated {
                if !result.retracted.iter().any(|(k, v)| *k == slot && *v == value) {
                    result.retracted.push((slot, value));
                }
            }
        }

        if let Some(age) = extract_age_normalized(&normalized) {
            result.context.set(SlotKey::Age, age.to_string());
        }

        if !result.is_empty() {
            tracing::trace!(
                slots = result.context.len(),
                retracted = result.retracted.len(),
                "Extracted slots"
            );
        }

        result
    }

    /// Extract a single slot value
    pub fn extract_slot(&self, slot: SlotKey, text: &str) -> Option<String> {
        if slot == SlotKey::Age {
            return self.extract_age(text).map(|a| a.to_string());
        }
        self.analyze(text).context.get(slot).map(str::to_string)
    }

    pub fn extract_state(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::State, &STATE_RULES, &normalize(text)).value
    }

    pub fn extract_occupation(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::Occupation, &OCCUPATION_RULES, &normalize(text))
            .value
    }

    /// Gender; "male or female" yields the `any` sentinel
    pub fn extract_gender(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::Gender, &GENDER_RULES, &normalize(text)).value
    }

    pub fn extract_caste_category(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::CasteCategory, &CASTE_RULES, &normalize(text))
            .value
    }

    /// Requested kind of help; `None` when no need keyword is present
    pub fn extract_help_type(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::HelpType, &HELP_TYPE_RULES, &normalize(text))
            .value
    }

    /// `higher` or `school`
    pub fn extract_education_level(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::EducationLevel, &EDUCATION_RULES, &normalize(text))
            .value
    }

    pub fn extract_disability(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::Disability, &DISABILITY_RULES, &normalize(text))
            .value
    }

    pub fn extract_bpl(&self, text: &str) -> Option<String> {
        self.match_slot(SlotKey::Bpl, &BPL_RULES, &normalize(text)).value
    }

    /// Age in years, only within 5..=100
    pub fn extract_age(&self, text: &str) -> Option<u32> {
        extract_age_normalized(&normalize(text))
    }

    fn match_slot(
        &self,
        slot: SlotKey,
        table: &[(Regex, &'static str)],
        text: &str,
    ) -> RuleMatch {
        let custom = self
            .custom_rules
            .get(&slot)
            .into_iter()
            .flatten()
            .map(|(re, value)| (re, value.as_str()));
        let builtin = table.iter().map(|(re, value)| (re, *value));

        let mut outcome = RuleMatch::default();
        for (regex, value) in custom.chain(builtin) {
            let mut affirmed = false;
            let mut denied = false;
            for m in regex.find_iter(text) {
                if is_negated(text, m.start()) {
                    denied = true;
                } else {
                    affirmed = true;
                    break;
                }
            }

            if affirmed {
                outcome.value = Some(value.to_string());
                return outcome;
            }
            if denied {
                outcome.negated.push(value.to_string());
            }
        }
        outcome
    }
}

/// Canonical English phrasing that extraction maps back to `value`
///
/// Used to confirm understood facts back to the user and to keep rule tables
/// honest in tests. Returns `None` for values no rule can produce.
pub fn canonical_phrase(slot: SlotKey, value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    let lower = v.to_lowercase();

    let phrase = match slot {
        SlotKey::Occupation => {
            let article = if lower.starts_with(['a', 'e', 'i', 'o', 'u']) {
                "an"
            } else {
                "a"
            };
            format!("I am {} {}", article, lower)
        },
        SlotKey::State => format!("I live in {}", v),
        SlotKey::Gender => match lower.as_str() {
            "male" | "female" => format!("I am {}", lower),
            _ => return None,
        },
        SlotKey::Age => {
            let age: u32 = lower.parse().ok()?;
            if !(MIN_AGE..=MAX_AGE).contains(&age) {
                return None;
            }
            format!("I am {} years old", age)
        },
        SlotKey::CasteCategory => format!("I belong to the {} category", v),
        SlotKey::HelpType => match lower.as_str() {
            "scholarship" => "I am looking for a scholarship".to_string(),
            "loan" => "I need a loan".to_string(),
            "pension" => "I need a pension".to_string(),
            "health_insurance" => "I need health insurance".to_string(),
            "housing" => "I need help with housing".to_string(),
            "marriage" => "I need help with marriage expenses".to_string(),
            "skill_training" => "I want skill training".to_string(),
            "employment" => "I am looking for a job".to_string(),
            "business_support" => "I want to start a business".to_string(),
            "agriculture_support" => "I need support for my crops".to_string(),
            "financial_assistance" => "I need financial assistance".to_string(),
            _ => return None,
        },
        SlotKey::Disability => match lower.as_str() {
            "yes" => "I am a person with a disability".to_string(),
            _ => return None,
        },
        SlotKey::Bpl => match lower.as_str() {
            "yes" => "My family is below the poverty line".to_string(),
            _ => return None,
        },
        SlotKey::EducationLevel => match lower.as_str() {
            "higher" => "I study in college".to_string(),
            "school" => "I study in class 8".to_string(),
            _ => return None,
        },
    };
    Some(phrase)
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn is_negated(text: &str, start: usize) -> bool {
    NEGATION_CUE.is_match(&text[..start])
}

fn extract_age_normalized(text: &str) -> Option<u32> {
    AGE_PATTERNS.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .find(|age| (MIN_AGE..=MAX_AGE).contains(age))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(text: &str) -> UserContext {
        SlotExtractor::new().extract(text)
    }

    #[test]
    fn test_multi_slot_message() {
        let c = ctx("I'm a female SC student from Karnataka looking for scholarships");
        assert_eq!(c.get(SlotKey::Occupation), Some("student"));
        assert_eq!(c.get(SlotKey::State), Some("Karnataka"));
        assert_eq!(c.get(SlotKey::Gender), Some("female"));
        assert_eq!(c.get(SlotKey::CasteCategory), Some("SC"));
        assert_eq!(c.help_type(), Some("scholarship"));
    }

    #[test]
    fn test_female_farmer_loan() {
        let c = ctx("I'm a female farmer from Bihar looking for loan");
        assert_eq!(c.get(SlotKey::Occupation), Some("farmer"));
        assert_eq!(c.get(SlotKey::State), Some("Bihar"));
        assert_eq!(c.get(SlotKey::Gender), Some("female"));
        assert_eq!(c.help_type(), Some("loan"));
    }

    #[test]
    fn test_help_type_extraction() {
        let extractor = SlotExtractor::new();
        let cases = [
            ("I'm looking for scholarships", Some("scholarship")),
            ("I need a loan for my business", Some("loan")),
            ("What pension schemes are available?", Some("pension")),
            ("I need health insurance", Some("health_insurance")),
            ("I want housing scheme", Some("housing")),
            ("I need help with marriage expenses", Some("marriage")),
            ("I want skill training", Some("skill_training")),
            ("I need money for my family", Some("financial_assistance")),
            ("Looking for a job", Some("employment")),
            ("I want to start a business", Some("business_support")),
            ("I need crop insurance", Some("agriculture_support")),
            ("mujhe shaadi ke liye madad chahiye", Some("marriage")),
            ("I want to know about government schemes", None),
        ];
        for (text, expected) in cases {
            assert_eq!(
                extractor.extract_help_type(text).as_deref(),
                expected,
                "help type for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_state_aliases_and_boundaries() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_state("I live in Bangalore").as_deref(), Some("Karnataka"));
        assert_eq!(extractor.extract_state("from orissa").as_deref(), Some("Odisha"));
        assert_eq!(extractor.extract_state("tamil  nadu").as_deref(), Some("Tamil Nadu"));
        assert_eq!(extractor.extract_state("my goal is a job"), None);
    }

    #[test]
    fn test_gender_rules() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_gender("I am male").as_deref(), Some("male"));
        assert_eq!(extractor.extract_gender("I am a woman").as_deref(), Some("female"));
        assert_eq!(extractor.extract_gender("open to male or female").as_deref(), Some("any"));
        assert!(ctx("schemes for male or female applicants")
            .get(SlotKey::Gender)
            .is_none());
    }

    #[test]
    fn test_caste_rules() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_caste_category("I am SC/ST").as_deref(), Some("SC/ST"));
        assert_eq!(extractor.extract_caste_category("scheduled tribe").as_deref(), Some("ST"));
        assert_eq!(extractor.extract_caste_category("I'm OBC").as_deref(), Some("OBC"));
        assert_eq!(extractor.extract_caste_category("general schemes please"), None);
    }

    #[test]
    fn test_age_extraction() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_age("I am 25 years old"), Some(25));
        assert_eq!(extractor.extract_age("my age is 62"), Some(62));
        assert_eq!(extractor.extract_age("I'm 19"), Some(19));
        assert_eq!(extractor.extract_age("meri umar 45 saal hai"), Some(45));
        assert_eq!(extractor.extract_age("I am 3 years old"), None);
        assert_eq!(extractor.extract_age("I am 150 years old"), None);
        assert_eq!(extractor.extract_age("I need 5000 rupees"), None);
    }

    #[test]
    fn test_age_skips_out_of_range_numbers() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_age("my 2 year old son lives with me, I am 34"), Some(34));
        assert_eq!(extractor.extract_age("she is 3 years old and I am 29 years old"), Some(29));
    }

    #[test]
    fn test_education_level() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_education_level("I am doing btech").as_deref(), Some("higher"));
        assert_eq!(extractor.extract_education_level("I'm in class 12").as_deref(), Some("higher"));
        assert_eq!(extractor.extract_education_level("studying in class 10").as_deref(), Some("school"));
        assert_eq!(extractor.extract_education_level("pre-matric student").as_deref(), Some("school"));
        assert_eq!(extractor.extract_education_level("I am a farmer"), None);
    }

    #[test]
    fn test_disability_and_bpl() {
        let c = ctx("I am divyang and my family is BPL");
        assert_eq!(c.get(SlotKey::Disability), Some("yes"));
        assert_eq!(c.get(SlotKey::Bpl), Some("yes"));
    }

    #[test]
    fn test_negated_caste_is_retracted() {
        let extractor = SlotExtractor::new();
        let result = extractor.analyze("I'm not SC, I am OBC");
        assert_eq!(result.context.get(SlotKey::CasteCategory), Some("OBC"));
        assert!(result
            .retracted
            .contains(&(SlotKey::CasteCategory, "SC".to_string())));

        let result = extractor.analyze("I am not disabled");
        assert_eq!(result.context.get(SlotKey::Disability), Some("no"));
        assert_eq!(result.retracted, vec![(SlotKey::Disability, "yes".to_string())]);

        let result = extractor.analyze("my family is not below the poverty line");
        assert_eq!(result.context.get(SlotKey::Bpl), Some("no"));
    }

    #[test]
    fn test_negation_does_not_leak() {
        let result = SlotExtractor::new().analyze("I am a farmer, not a student");
        assert_eq!(result.context.get(SlotKey::Occupation), Some("farmer"));
        assert!(result.retracted.is_empty());
    }

    #[test]
    fn test_canonical_phrase_round_trip() {
        let extractor = SlotExtractor::new();
        let cases: Vec<(SlotKey, &[&str])> = vec![
            (
                SlotKey::Occupation,
                &["farmer", "student", "senior citizen", "entrepreneur", "worker", "fisherman", "artisan"],
            ),
            (SlotKey::State, &["Karnataka", "Tamil Nadu", "Bihar", "Jammu and Kashmir"]),
            (SlotKey::Gender, &["male", "female"]),
            (SlotKey::Age, &["5", "25", "100"]),
            (SlotKey::CasteCategory, &["SC/ST", "SC", "ST", "OBC", "General", "Minority"]),
            (
                SlotKey::HelpType,
                &[
                    "scholarship",
                    "loan",
                    "pension",
                    "health_insurance",
                    "housing",
                    "marriage",
                    "skill_training",
                    "employment",
                    "business_support",
                    "agriculture_support",
                    "financial_assistance",
                ],
            ),
            (SlotKey::Disability, &["yes"]),
            (SlotKey::Bpl, &["yes"]),
            (SlotKey::EducationLevel, &["higher", "school"]),
        ];

        for (slot, values) in cases {
            for value in values {
                let phrase = canonical_phrase(slot, value).unwrap();
                assert_eq!(
                    extractor.extract_slot(slot, &phrase).as_deref(),
                    Some(*value),
                    "round trip of {}={:?} via {:?}",
                    slot,
                    value,
                    phrase
                );
            }
        }
    }

    #[test]
    fn test_canonical_phrase_rejects_unknown() {
        assert!(canonical_phrase(SlotKey::HelpType, "lottery").is_none());
        assert!(canonical_phrase(SlotKey::Age, "200").is_none());
        assert!(canonical_phrase(SlotKey::Gender, "any").is_none());
    }

    #[test]
    fn test_custom_rules_take_precedence() {
        let mut custom_patterns = HashMap::new();
        custom_patterns.insert(
            "occupation".to_string(),
            vec![(r"\bbeekeeper\b".to_string(), "farmer".to_string())],
        );
        let extractor = SlotExtractor::from_config(SlotExtractionConfig { custom_patterns }).unwrap();
        assert_eq!(extractor.extract_occupation("I am a Beekeeper").as_deref(), Some("farmer"));
    }

    #[test]
    fn test_invalid_custom_rule() {
        let mut custom_patterns = HashMap::new();
        custom_patterns.insert("state".to_string(), vec![("(unclosed".to_string(), "X".to_string())]);
        assert!(SlotExtractor::from_config(SlotExtractionConfig { custom_patterns }).is_err());

        let mut custom_patterns = HashMap::new();
        custom_patterns.insert("income".to_string(), vec![]);
        assert!(SlotExtractor::from_config(SlotExtractionConfig { custom_patterns }).is_err());
    }

    #[test]
    fn test_empty_text() {
        assert!(SlotExtractor::new().analyze("   ").is_empty());
    }
}
