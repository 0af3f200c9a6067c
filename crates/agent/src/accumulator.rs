//! Context accumulation across conversation turns
//!
//! Every user turn is run through the slot extractor and folded into one
//! `UserContext`, oldest first, so a later answer replaces an earlier one.
//! Explicit denials ("I'm not OBC") withdraw a previously stored value when
//! it matches.
//!
//! `ConversationState` is the incremental form: the caller keeps it between
//! turns and only the new message is extracted.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use scheme_saathi_core::{ChatMessage, UserContext};
use scheme_saathi_text_processing::SlotExtractor;

/// Folds extracted slots into a cumulative context
#[derive(Debug, Clone, Default)]
pub struct ContextAccumulator {
    extractor: SlotExtractor,
}

impl ContextAccumulator {
    pub fn new(extractor: SlotExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &SlotExtractor {
        &self.extractor
    }

    /// Apply one user message to `ctx`; returns true if anything changed
    pub fn apply(&self, ctx: &mut UserContext, text: &str) -> bool {
        let extraction = self.extractor.analyze(text);
        if extraction.is_empty() {
            return false;
        }

        let before = ctx.clone();
        for (slot, value) in &extraction.retracted {
            if ctx.get(*slot).is_some_and(|current| current.eq_ignore_ascii_case(value)) {
                tracing::debug!(slot = %slot, value = %value, "Retracting slot value");
                ctx.remove(*slot);
            }
        }
        ctx.merge(&extraction.context);

        *ctx != before
    }

    /// Context from all prior user turns followed by the current message
    pub fn accumulate(&self, history: &[ChatMessage], current_message: &str) -> UserContext {
        let mut ctx = UserContext::new();
        for message in history.iter().filter(|m| m.is_user()) {
            self.apply(&mut ctx, &message.content);
        }
        self.apply(&mut ctx, current_message);
        ctx
    }
}

/// Per-conversation state carried by the caller between turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    context: UserContext,
    history: VecDeque<ChatMessage>,
    window: usize,
}

impl ConversationState {
    /// Empty state keeping at most `window` messages
    pub fn new(window: usize) -> Self {
        Self {
            context: UserContext::new(),
            history: VecDeque::with_capacity(window),
            window: window.max(1),
        }
    }

    /// Rebuild state from an existing transcript
    pub fn from_history(
        accumulator: &ContextAccumulator,
        history: &[ChatMessage],
        window: usize,
    ) -> Self {
        let mut state = Self::new(window);
        for message in history {
            if message.is_user() {
                accumulator.apply(&mut state.context, &message.content);
            }
            state.push(message.clone());
        }
        state
    }

    /// Record a user message and fold its slots into the context
    pub fn observe(&mut self, accumulator: &ContextAccumulator, message: &str) -> &UserContext {
        if accumulator.apply(&mut self.context, message) {
            tracing::debug!(slots = self.context.len(), "Context updated");
        }
        self.push(ChatMessage::user(message));
        &self.context
    }

    /// Record an assistant reply (no extraction)
    pub fn record_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    pub fn context(&self) -> &UserContext {
        &self.context
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Forget everything said so far
    pub fn reset(&mut self) {
        self.context = UserContext::new();
        self.history.clear();
    }

    fn push(&mut self, message: ChatMessage) {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(message);
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(scheme_saathi_config::constants::recommendation::HISTORY_WINDOW)
    }
}

/// User-authored messages among the last `n` messages, oldest first
pub fn recent_user_messages<'a, I>(history: I, n: usize) -> Vec<&'a str>
where
    I: DoubleEndedIterator<Item = &'a ChatMessage>,
{
    let mut recent: Vec<&str> = history
        .rev()
        .take(n)
        .filter(|m| m.is_user())
        .map(|m| m.content.as_str())
        .collect();
    recent.reverse();
    recent
}
