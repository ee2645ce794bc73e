//! Keyword Command Generator
//!
//! A deterministic, rule-based generator. It looks for flow ids and a handful of
//! trigger words in the message and consults the tracker for the active flow and
//! the requested slot. Useful as an offline fallback and for integration tests
//! that must not depend on a model backend.

use crate::{
    command::Command, flows::Flow, flows::FlowsList, generator::CommandGenerator,
    message::Message, tracker::DialogueStateTracker,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const CANCEL_WORDS: &[&str] = &["cancel", "stop", "abort", "nevermind"];
const HANDOFF_WORDS: &[&str] = &["human", "agent", "operator", "representative"];
/// Flow id tokens that say nothing about what the flow does.
const GENERIC_FLOW_TOKENS: &[&str] = &["flow", "the", "a"];

/// Predicts commands from trigger words and flow-id mentions.
#[derive(Debug, Clone)]
pub struct KeywordCommandGenerator {
    cancel_words: Vec<String>,
    handoff_words: Vec<String>,
}

impl Default for KeywordCommandGenerator {
    fn default() -> Self {
        Self {
            cancel_words: CANCEL_WORDS.iter().map(|w| w.to_string()).collect(),
            handoff_words: HANDOFF_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl KeywordCommandGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the words that trigger a `CancelFlow`.
    pub fn with_cancel_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cancel_words = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }

    /// Replaces the words that trigger a `HumanHandoff`.
    pub fn with_handoff_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handoff_words = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }

    fn contains_any(words: &[String], triggers: &[String]) -> bool {
        words.iter().any(|word| triggers.contains(word))
    }
}

/// Lower-cased alphanumeric words of `text`.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A flow is mentioned when every significant token of its id appears as a word,
/// optionally pluralized.
fn mentions_flow(words: &[String], flow: &Flow) -> bool {
    let tokens: Vec<String> = tokenize(&flow.id)
        .into_iter()
        .filter(|token| !GENERIC_FLOW_TOKENS.contains(&token.as_str()))
        .collect();
    !tokens.is_empty()
        && tokens.iter().all(|token| {
            words
                .iter()
                .any(|word| word == token || word.strip_suffix('s') == Some(token.as_str()))
        })
}

#[async_trait]
impl CommandGenerator for KeywordCommandGenerator {
    async fn predict_commands(
        &self,
        message: &Message,
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Result<Vec<Command>> {
        if message.text().trim().is_empty() {
            return Ok(Vec::new());
        }
        let words = tokenize(message.text());

        if Self::contains_any(&words, &self.handoff_words) {
            debug!(text = %message.text(), "Handoff requested");
            return Ok(vec![Command::HumanHandoff]);
        }

        let mentioned: Vec<&str> = flows
            .map(|flows| {
                flows
                    .iter()
                    .filter(|flow| mentions_flow(&words, flow))
                    .map(|flow| flow.id.as_str())
                    .collect()
            })
            .unwrap_or_default();
        let active_flow = tracker.and_then(DialogueStateTracker::active_flow);
        let wants_cancel = Self::contains_any(&words, &self.cancel_words);

        let mut commands = Vec::new();
        if wants_cancel {
            if let Some(flow) = mentioned.first().copied().or(active_flow) {
                commands.push(Command::CancelFlow {
                    flow: flow.to_string(),
                });
            }
        } else if mentioned.len() == 1 {
            if Some(mentioned[0]) != active_flow {
                commands.push(Command::StartFlow {
                    flow: mentioned[0].to_string(),
                });
            }
        } else if mentioned.len() > 1 {
            commands.push(Command::Clarify {
                options: mentioned.iter().map(|id| id.to_string()).collect(),
            });
        } else if let Some(slot) = tracker.and_then(DialogueStateTracker::requested_slot) {
            commands.push(Command::SetSlot {
                name: slot.to_string(),
                value: Value::String(message.text().trim().to_string()),
            });
        } else if message.text().trim_end().ends_with('?') {
            commands.push(Command::KnowledgeAnswer);
        } else {
            commands.push(Command::ChitChatAnswer);
        }

        debug!(
            text = %message.text(),
            mentioned = ?mentioned,
            commands = ?commands,
            "Keyword prediction"
        );
        Ok(commands)
    }
}
