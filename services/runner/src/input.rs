//! Input Loading
//!
//! Reads the batch of messages and the optional flows and tracker from JSON
//! files. Messages may be given as a JSON array or as JSON lines; each entry is
//! a plain string, an object of message fields (`{"text": ...}`), or a full
//! serialized `Message`.

use anyhow::{Context, Result};
use cdu_core::{DialogueStateTracker, FlowsList, Message};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// A message exactly as `Message` serializes it. Any other key means the object
/// is a plain field map.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SerializedMessage {
    data: Map<String, Value>,
    #[serde(default)]
    output_properties: BTreeSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageInput {
    Text(String),
    Full(SerializedMessage),
    Fields(Map<String, Value>),
}

impl From<MessageInput> for Message {
    fn from(input: MessageInput) -> Self {
        match input {
            MessageInput::Text(text) => Message::new(text),
            MessageInput::Full(serialized) => Message {
                data: serialized.data,
                output_properties: serialized.output_properties,
            },
            MessageInput::Fields(data) => Message::from_data(data),
        }
    }
}

/// Parses a batch of messages from a JSON array or JSON lines.
pub fn parse_messages(content: &str) -> Result<Vec<Message>> {
    if content.trim_start().starts_with('[') {
        let inputs: Vec<MessageInput> =
            serde_json::from_str(content).context("Failed to parse message array")?;
        return Ok(inputs.into_iter().map(Message::from).collect());
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<MessageInput>(line)
                .map(Message::from)
                .with_context(|| format!("Failed to parse message on line {}", number + 1))
        })
        .collect()
}

pub fn load_messages(path: &Path) -> Result<Vec<Message>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read messages from {}", path.display()))?;
    parse_messages(&content)
}

pub fn load_flows(path: &Path) -> Result<FlowsList> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read flows from {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse flows")
}

pub fn load_tracker(path: &Path) -> Result<DialogueStateTracker> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tracker from {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse tracker")
}
