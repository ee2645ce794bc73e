//! Conversation State
//!
//! The tracker is the accumulated state of a conversation up to the current
//! turn. Command generators only ever read it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueStateTracker {
    pub sender_id: String,
    /// Slots filled so far, keyed by slot name.
    #[serde(default)]
    pub slots: BTreeMap<String, Value>,
    /// Flows that are currently running; the last entry is the active one.
    #[serde(default)]
    pub flow_stack: Vec<String>,
    /// The slot the assistant asked the user to fill in its last turn.
    #[serde(default)]
    pub requested_slot: Option<String>,
    #[serde(default)]
    pub latest_message: Option<String>,
}

impl DialogueStateTracker {
    pub fn new(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            ..Default::default()
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: Value) -> Self {
        self.slots.insert(name.into(), value);
        self
    }

    pub fn with_active_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow_stack.push(flow.into());
        self
    }

    pub fn with_requested_slot(mut self, slot: impl Into<String>) -> Self {
        self.requested_slot = Some(slot.into());
        self
    }

    pub fn get_slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Returns the flow on top of the stack, if any flow is running.
    pub fn active_flow(&self) -> Option<&str> {
        self.flow_stack.last().map(String::as_str)
    }

    pub fn requested_slot(&self) -> Option<&str> {
        self.requested_slot.as_deref()
    }
}
