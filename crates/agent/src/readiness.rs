//! Readiness gate
//!
//! Decides whether enough is known to recommend schemes, and otherwise which
//! field to ask about next.

use serde::Serialize;

use scheme_saathi_core::{SlotKey, UserContext};

/// Fields that are enough for a rough search
const BASIC_FIELDS: [SlotKey; 2] = [SlotKey::Occupation, SlotKey::State];

/// Fields required before recommending
const REQUIRED_FIELDS: [SlotKey; 3] = [SlotKey::Occupation, SlotKey::State, SlotKey::HelpType];

/// At least one of these must be known before recommending
const DEMOGRAPHIC_FIELDS: [SlotKey; 3] = [SlotKey::Gender, SlotKey::Age, SlotKey::CasteCategory];

/// Outcome of the readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "field", rename_all = "snake_case")]
pub enum ReadinessDecision {
    Ready,
    NeedsField(SlotKey),
}

impl ReadinessDecision {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn missing_field(&self) -> Option<SlotKey> {
        match self {
            Self::Ready => None,
            Self::NeedsField(field) => Some(*field),
        }
    }
}

/// Readiness rules over a user context
pub struct ReadinessGate;

impl ReadinessGate {
    /// Occupation and state are known
    pub fn has_enough_context(ctx: &UserContext) -> bool {
        BASIC_FIELDS.iter().all(|f| ctx.is_valid(*f))
    }

    /// Occupation, state and help type are known, plus one demographic field
    pub fn is_ready_to_recommend(ctx: &UserContext) -> bool {
        REQUIRED_FIELDS.iter().all(|f| ctx.is_valid(*f))
            && DEMOGRAPHIC_FIELDS.iter().any(|f| ctx.is_valid(*f))
    }

    /// Fields still needed, in the order they should be asked
    pub fn missing_fields(ctx: &UserContext) -> Vec<SlotKey> {
        let mut missing: Vec<SlotKey> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !ctx.is_valid(*f))
            .collect();

        if !DEMOGRAPHIC_FIELDS.iter().any(|f| ctx.is_valid(*f)) {
            missing.push(SlotKey::Gender);
        }
        missing
    }

    pub fn decide(ctx: &UserContext) -> ReadinessDecision {
        match Self::missing_fields(ctx).first() {
            None => ReadinessDecision::Ready,
            Some(field) => ReadinessDecision::NeedsField(*field),
        }
    }

    /// Number of profile fields known, out of `SlotKey::PROFILE.len()`
    pub fn completeness(ctx: &UserContext) -> usize {
        SlotKey::PROFILE.iter().filter(|f| ctx.is_valid(**f)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> UserContext {
        UserContext::new().with(SlotKey::Occupation, "student")
    }

    #[test]
    fn test_question_order() {
        assert_eq!(
            ReadinessGate::missing_fields(&UserContext::new()),
            vec![SlotKey::Occupation, SlotKey::State, SlotKey::HelpType, SlotKey::Gender]
        );

        let ctx = student();
        assert_eq!(ReadinessGate::missing_fields(&ctx)[0], SlotKey::State);

        let ctx = ctx.with(SlotKey::State, "Karnataka");
        assert_eq!(ReadinessGate::missing_fields(&ctx)[0], SlotKey::HelpType);

        let ctx = ctx.with(SlotKey::HelpType, "scholarship");
        assert_eq!(ReadinessGate::missing_fields(&ctx), vec![SlotKey::Gender]);
        assert_eq!(ReadinessGate::decide(&ctx), ReadinessDecision::NeedsField(SlotKey::Gender));
    }

    #[test]
    fn test_ready_contract() {
        let ctx = student().with(SlotKey::State, "Karnataka");
        assert!(ReadinessGate::has_enough_context(&ctx));
        assert!(!ReadinessGate::is_ready_to_recommend(&ctx));

        let ctx = ctx.with(SlotKey::HelpType, "scholarship");
        assert!(!ReadinessGate::is_ready_to_recommend(&ctx));

        let ctx = ctx.with(SlotKey::Gender, "female");
        assert!(ReadinessGate::is_ready_to_recommend(&ctx));
        assert!(ReadinessGate::decide(&ctx).is_ready());
        assert!(ReadinessGate::missing_fields(&ctx).is_empty());
    }

    #[test]
    fn test_any_demographic_field_suffices() {
        let base = student()
            .with(SlotKey::State, "Bihar")
            .with(SlotKey::HelpType, "loan");
        assert!(ReadinessGate::is_ready_to_recommend(&base.clone().with(SlotKey::Age, "21")));
        assert!(ReadinessGate::is_ready_to_recommend(&base.with(SlotKey::CasteCategory, "OBC")));
    }

    #[test]
    fn test_gender_not_asked_when_age_known() {
        let ctx = UserContext::new().with(SlotKey::Age, "30");
        assert!(!ReadinessGate::missing_fields(&ctx).contains(&SlotKey::Gender));
    }

    #[test]
    fn test_sentinels_count_as_missing() {
        let mut ctx = student();
        ctx.set(SlotKey::State, "All India");
        ctx.set(SlotKey::Gender, "any");
        assert!(!ReadinessGate::has_enough_context(&ctx));
        assert_eq!(ReadinessGate::decide(&ctx).missing_field(), Some(SlotKey::State));
    }

    #[test]
    fn test_completeness() {
        assert_eq!(ReadinessGate::completeness(&UserContext::new()), 0);
        let ctx = student()
            .with(SlotKey::State, "Bihar")
            .with(SlotKey::Gender, "male");
        assert_eq!(ReadinessGate::completeness(&ctx), 3);
    }
}
