//! Recommendation turn orchestration
//!
//! One turn: accumulate context, check readiness, and when ready retrieve,
//! filter and rank candidates. A turn never fails; retrieval problems
//! surface as an empty candidate list plus logs.

use metrics::counter;
use serde::Serialize;
use std::sync::Arc;

use scheme_saathi_config::{RecommendationConfig, Settings};
use scheme_saathi_core::{CandidateResult, ChatMessage, SlotKey, UserContext};
use scheme_saathi_rag::{IndexHealth, RetrieverConfig, SchemeIndex, SemanticRetriever};
use scheme_saathi_text_processing::{SlotExtractionConfig, SlotExtractor};

use crate::accumulator::{recent_user_messages, ContextAccumulator, ConversationState};
use crate::filters::{apply_all, default_filters, CandidateFilter};
use crate::ranker::Ranker;
use crate::readiness::ReadinessGate;
use crate::AgentError;

/// Result of one recommendation turn
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub ready: bool,
    /// Next field to ask about when not ready
    pub missing_field: Option<SlotKey>,
    pub context: UserContext,
    /// Known profile fields out of `SlotKey::PROFILE`
    pub completeness: usize,
    pub candidates: Vec<CandidateResult>,
}

impl Recommendation {
    /// Truncated copy for presentation
    pub fn top(&self, n: usize) -> Self {
        Self {
            candidates: self.candidates.iter().take(n).cloned().collect(),
            ..self.clone()
        }
    }
}

/// Recommendation limits
#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    pub default_top_k: usize,
    pub display_top_k: usize,
    /// Candidates retrieved per requested result, to leave room for filtering
    pub candidate_multiplier: usize,
    pub history_window: usize,
    pub recent_turns: usize,
}

impl From<&RecommendationConfig> for RecommenderConfig {
    fn from(config: &RecommendationConfig) -> Self {
        Self {
            default_top_k: config.default_top_k,
            display_top_k: config.display_top_k,
            candidate_multiplier: config.candidate_multiplier.max(1),
            history_window: config.history_window,
            recent_turns: config.recent_turns,
        }
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self::from(&RecommendationConfig::default())
    }
}

/// The recommendation engine
pub struct Recommender {
    accumulator: ContextAccumulator,
    index: Arc<SchemeIndex>,
    retriever: SemanticRetriever,
    filters: Vec<Box<dyn CandidateFilter>>,
    config: RecommenderConfig,
}

impl Recommender {
    pub fn new(
        accumulator: ContextAccumulator,
        index: Arc<SchemeIndex>,
        retriever_config: RetrieverConfig,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            accumulator,
            retriever: SemanticRetriever::new(Arc::clone(&index), retriever_config),
            index,
            filters: default_filters(),
            config,
        }
    }

    /// Build extractor, scheme index and retriever from settings
    pub async fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let extractor = SlotExtractor::from_config(SlotExtractionConfig {
            custom_patterns: settings.extraction.custom_patterns.clone(),
        })?;
        let index = Arc::new(SchemeIndex::open(settings).await?);

        Ok(Self::new(
            ContextAccumulator::new(extractor),
            index,
            RetrieverConfig::from(&settings.rag),
            RecommenderConfig::from(&settings.recommendation),
        ))
    }

    /// Replace the post-retrieval filter chain
    pub fn with_filters(mut self, filters: Vec<Box<dyn CandidateFilter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn accumulator(&self) -> &ContextAccumulator {
        &self.accumulator
    }

    pub async fn health(&self) -> IndexHealth {
        self.index.health().await
    }

    /// Fresh per-conversation state
    pub fn new_conversation(&self) -> ConversationState {
        ConversationState::new(self.config.history_window)
    }

    /// Stateless turn over a full transcript
    pub async fn recommend(
        &self,
        history: &[ChatMessage],
        message: &str,
        top_k: Option<usize>,
    ) -> Recommendation {
        let ctx = self.accumulator.accumulate(history, message);
        let window = &history[history.len().saturating_sub(self.config.recent_turns)..];
        let recent = recent_user_messages(window.iter(), self.config.recent_turns);
        self.respond(ctx, message, &recent, top_k).await
    }

    /// Incremental turn; `state` is updated with the new message
    pub async fn recommend_turn(
        &self,
        state: &mut ConversationState,
        message: &str,
        top_k: Option<usize>,
    ) -> Recommendation {
        let history: Vec<&ChatMessage> = state.history().collect();
        let recent: Vec<String> = recent_user_messages(history.into_iter(), self.config.recent_turns)
            .into_iter()
            .map(str::to_string)
            .collect();

        let ctx = state.observe(&self.accumulator, message).clone();
        let recent: Vec<&str> = recent.iter().map(String::as_str).collect();
        self.respond(ctx, message, &recent, top_k).await
    }

    async fn respond(
        &self,
        ctx: UserContext,
        message: &str,
        recent: &[&str],
        top_k: Option<usize>,
    ) -> Recommendation {
        let decision = ReadinessGate::decide(&ctx);
        let completeness = ReadinessGate::completeness(&ctx);
        let ready_label = if decision.is_ready() { "true" } else { "false" };
        counter!("scheme_recommend_total", "ready" => ready_label).increment(1);

        if !decision.is_ready() {
            tracing::info!(
                slots = ctx.len(),
                completeness,
                missing = ?decision.missing_field(),
                "Not enough context to recommend"
            );
            return Recommendation {
                ready: false,
                missing_field: decision.missing_field(),
                context: ctx,
                completeness,
                candidates: Vec::new(),
            };
        }

        let top_k = top_k.unwrap_or(self.config.default_top_k);
        let search_text = search_text(message, &ctx, recent);
        let retrieved = self
            .retriever
            .search(&search_text, &ctx, top_k.saturating_mul(self.config.candidate_multiplier))
            .await;
        let retrieved_count = retrieved.len();

        let filtered = apply_all(&self.filters, retrieved, &ctx);
        let candidates = Ranker::new(top_k).rank(filtered);

        tracing::info!(
            retrieved = retrieved_count,
            returned = candidates.len(),
            top_k,
            completeness,
            "Recommendation complete"
        );

        Recommendation {
            ready: true,
            missing_field: None,
            context: ctx,
            completeness,
            candidates,
        }
    }
}

/// Current message, stated gender and recent user turns
fn search_text(message: &str, ctx: &UserContext, recent: &[&str]) -> String {
    let mut parts: Vec<&str> = vec![message.trim()];
    if ctx.is_valid(SlotKey::Gender) {
        if let Some(gender) = ctx.get(SlotKey::Gender) {
            parts.push(gender);
        }
    }
    parts.extend(recent.iter().map(|m| m.trim()).filter(|m| *m != message.trim()));
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text() {
        let ctx = UserContext::new().with(SlotKey::Gender, "female");
        assert_eq!(
            search_text("need scholarship", &ctx, &["I am a student", "from Karnataka"]),
            "need scholarship female I am a student from Karnataka"
        );
        assert_eq!(search_text("hello", &UserContext::new(), &["hello"]), "hello");
    }

    #[test]
    fn test_config_from_settings() {
        let config = RecommenderConfig::default();
        assert_eq!(config.default_top_k, 20);
        assert_eq!(config.display_top_k, 7);
        assert_eq!(config.candidate_multiplier, 2);
        assert_eq!(config.history_window, 20);
    }
}
