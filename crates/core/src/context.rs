//! Cumulative user context built from conversation turns
//!
//! A `UserContext` maps eligibility slots to string values. Sentinel values
//! (`""`, `"unknown"`, `"any"`, `"All India"`) mean "not known" and are never
//! stored, so every value held by a context is a real answer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Values that stand for an unset slot (compared case-insensitively)
pub const SENTINEL_VALUES: &[&str] = &["", "unknown", "any", "all india"];

/// Returns true when `value` is a real answer rather than a sentinel
pub fn is_valid_value(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    !SENTINEL_VALUES.contains(&normalized.as_str())
}

/// Eligibility slot names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    Occupation,
    State,
    Gender,
    Age,
    CasteCategory,
    /// The specific kind of help requested (scholarship, loan, ...)
    #[serde(alias = "specific_need")]
    HelpType,
    Disability,
    Bpl,
    EducationLevel,
}

impl SlotKey {
    pub const ALL: [SlotKey; 9] = [
        SlotKey::Occupation,
        SlotKey::State,
        SlotKey::Gender,
        SlotKey::Age,
        SlotKey::CasteCategory,
        SlotKey::HelpType,
        SlotKey::Disability,
        SlotKey::Bpl,
        SlotKey::EducationLevel,
    ];

    /// Profile fields counted by completeness reporting
    pub const PROFILE: [SlotKey; 5] = [
        SlotKey::State,
        SlotKey::Occupation,
        SlotKey::Gender,
        SlotKey::Age,
        SlotKey::CasteCategory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKey::Occupation => "occupation",
            SlotKey::State => "state",
            SlotKey::Gender => "gender",
            SlotKey::Age => "age",
            SlotKey::CasteCategory => "caste_category",
            SlotKey::HelpType => "help_type",
            SlotKey::Disability => "disability",
            SlotKey::Bpl => "bpl",
            SlotKey::EducationLevel => "education_level",
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "occupation" => Ok(SlotKey::Occupation),
            "state" => Ok(SlotKey::State),
            "gender" => Ok(SlotKey::Gender),
            "age" => Ok(SlotKey::Age),
            "caste_category" | "caste" | "category" => Ok(SlotKey::CasteCategory),
            "help_type" | "specific_need" => Ok(SlotKey::HelpType),
            "disability" => Ok(SlotKey::Disability),
            "bpl" => Ok(SlotKey::Bpl),
            "education_level" | "education" => Ok(SlotKey::EducationLevel),
            other => Err(format!("unknown slot: {}", other)),
        }
    }
}

/// Cumulative user context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<SlotKey, String>", into = "BTreeMap<SlotKey, String>")]
pub struct UserContext {
    slots: BTreeMap<SlotKey, String>,
}

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly for tests and fixtures
    pub fn with(mut self, key: SlotKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Store a value; sentinels are ignored. Returns true if the value was stored.
    pub fn set(&mut self, key: SlotKey, value: impl Into<String>) -> bool {
        let value = value.into();
        let trimmed = value.trim();
        if !is_valid_value(trimmed) {
            return false;
        }
        self.slots.insert(key, trimmed.to_string());
        true
    }

    pub fn get(&self, key: SlotKey) -> Option<&str> {
        self.slots.get(&key).map(String::as_str)
    }

    /// Lowercased value, convenient for rule comparisons
    pub fn get_lower(&self, key: SlotKey) -> Option<String> {
        self.get(key).map(str::to_lowercase)
    }

    /// True when the slot holds a real (non-sentinel) answer
    pub fn is_valid(&self, key: SlotKey) -> bool {
        self.get(key).is_some_and(is_valid_value)
    }

    pub fn remove(&mut self, key: SlotKey) -> Option<String> {
        self.slots.remove(&key)
    }

    /// Overlay `other` on top of `self`: every value in `other` wins
    pub fn merge(&mut self, other: &UserContext) {
        for (key, value) in &other.slots {
            self.slots.insert(*key, value.clone());
        }
    }

    /// The requested need, if any (`help_type`, also known as `specific_need`)
    pub fn help_type(&self) -> Option<&str> {
        self.get(SlotKey::HelpType)
    }

    /// Age parsed as whole years
    pub fn age_years(&self) -> Option<u32> {
        self.get(SlotKey::Age).and_then(|a| a.trim().parse().ok())
    }

    /// Whether a yes/no slot (disability, bpl) holds an affirmative answer
    pub fn flag(&self, key: SlotKey) -> bool {
        matches!(
            self.get_lower(key).as_deref(),
            Some("yes") | Some("true") | Some("y")
        )
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &str)> {
        self.slots.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl From<BTreeMap<SlotKey, String>> for UserContext {
    fn from(map: BTreeMap<SlotKey, String>) -> Self {
        let mut ctx = UserContext::new();
        for (key, value) in map {
            ctx.set(key, value);
        }
        ctx
    }
}

impl From<UserContext> for BTreeMap<SlotKey, String> {
    fn from(ctx: UserContext) -> Self {
        ctx.slots
    }
}

impl FromIterator<(SlotKey, String)> for UserContext {
    fn from_iter<I: IntoIterator<Item = (SlotKey, String)>>(iter: I) -> Self {
        let mut ctx = UserContext::new();
        for (key, value) in iter {
            ctx.set(key, value);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_not_valid() {
        for sentinel in ["", "unknown", "any", "All India", "  UNKNOWN "] {
            assert!(!is_valid_value(sentinel), "{:?} should be a sentinel", sentinel);
        }
        assert!(is_valid_value("Karnataka"));
        assert!(is_valid_value("student"));
    }

    #[test]
    fn test_set_ignores_sentinels() {
        let mut ctx = UserContext::new();
        assert!(!ctx.set(SlotKey::State, "All India"));
        assert!(!ctx.set(SlotKey::Occupation, "any"));
        assert!(ctx.is_empty());

        assert!(ctx.set(SlotKey::State, " Bihar "));
        assert_eq!(ctx.get(SlotKey::State), Some("Bihar"));
    }

    #[test]
    fn test_merge_overwrites() {
        let mut ctx = UserContext::new()
            .with(SlotKey::State, "Bihar")
            .with(SlotKey::Gender, "male");
        let newer = UserContext::new().with(SlotKey::State, "Kerala");
        ctx.merge(&newer);

        assert_eq!(ctx.get(SlotKey::State), Some("Kerala"));
        assert_eq!(ctx.get(SlotKey::Gender), Some("male"));
    }

    #[test]
    fn test_specific_need_alias() {
        let ctx: UserContext =
            serde_json::from_str(r#"{"specific_need": "loan", "state": "unknown"}"#).unwrap();
        assert_eq!(ctx.help_type(), Some("loan"));
        assert!(!ctx.is_valid(SlotKey::State));

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["help_type"], "loan");
    }

    #[test]
    fn test_slot_key_parsing() {
        assert_eq!("specific_need".parse::<SlotKey>(), Ok(SlotKey::HelpType));
        assert_eq!("caste_category".parse::<SlotKey>(), Ok(SlotKey::CasteCategory));
        assert!("income".parse::<SlotKey>().is_err());
    }

    #[test]
    fn test_age_and_flags() {
        let ctx = UserContext::new()
            .with(SlotKey::Age, "45")
            .with(SlotKey::Disability, "yes");
        assert_eq!(ctx.age_years(), Some(45));
        assert!(ctx.flag(SlotKey::Disability));
        assert!(!ctx.flag(SlotKey::Bpl));
    }
}
