//! Message Representation
//!
//! A `Message` is one turn of user input together with the annotations that
//! components attach to it while it moves through the pipeline.

use crate::command::{Command, CommandRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Field holding the raw user text.
pub const TEXT: &str = "text";
/// Field holding the serialized commands predicted for the message.
pub const COMMANDS: &str = "commands";

/// A keyed record for one user turn.
///
/// Fields listed in `output_properties` are part of the message's external
/// rendering (see [`Message::as_output`]); everything else is internal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub data: Map<String, Value>,
    #[serde(default)]
    pub output_properties: BTreeSet<String>,
}

impl Message {
    /// Creates a message holding only the user's text.
    pub fn new(text: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert(TEXT.to_string(), Value::String(text.into()));
        Self {
            data,
            output_properties: BTreeSet::new(),
        }
    }

    /// Creates a message from an existing field map.
    pub fn from_data(data: Map<String, Value>) -> Self {
        Self {
            data,
            output_properties: BTreeSet::new(),
        }
    }

    /// Returns the user text, or an empty string if the message has none.
    pub fn text(&self) -> &str {
        self.data.get(TEXT).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Sets `field` to `value`, overwriting any previous value.
    ///
    /// With `add_to_output` the field is included in [`Message::as_output`].
    pub fn set(&mut self, field: &str, value: Value, add_to_output: bool) {
        self.data.insert(field.to_string(), value);
        if add_to_output {
            self.output_properties.insert(field.to_string());
        }
    }

    /// Renders the externally visible part of the message: the text and every
    /// output property.
    pub fn as_output(&self) -> Map<String, Value> {
        self.data
            .iter()
            .filter(|(key, _)| key.as_str() == TEXT || self.output_properties.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Decodes the records stored under [`COMMANDS`].
    ///
    /// A message that was never processed has no commands and yields an empty list.
    pub fn commands(&self) -> serde_json::Result<Vec<Command>> {
        match self.data.get(COMMANDS) {
            None => Ok(Vec::new()),
            Some(value) => {
                let records: Vec<CommandRecord> = serde_json::from_value(value.clone())?;
                records.into_iter().map(Command::from_record).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_message_exposes_text() {
        let message = Message::new("I want to book a table");
        assert_eq!(message.text(), "I want to book a table");
        assert!(message.output_properties.is_empty());
    }

    #[test]
    fn test_text_defaults_to_empty() {
        let message = Message::from_data(Map::new());
        assert_eq!(message.text(), "");
    }

    #[test]
    fn test_set_without_output_stays_internal() {
        let mut message = Message::new("hi");
        message.set("tokens", json!(["hi"]), false);

        assert_eq!(message.get("tokens"), Some(&json!(["hi"])));
        let output = message.as_output();
        assert!(!output.contains_key("tokens"));
        assert_eq!(output[TEXT], json!("hi"));
    }

    #[test]
    fn test_set_with_output_overwrites_and_surfaces() {
        let mut message = Message::new("hi");
        message.set(COMMANDS, json!([]), true);
        message.set(COMMANDS, json!([{ "command": "ChitChatAnswer" }]), true);

        let output = message.as_output();
        assert_eq!(output.len(), 2);
        assert_eq!(output[COMMANDS], json!([{ "command": "ChitChatAnswer" }]));
    }

    #[test]
    fn test_commands_decodes_stored_records() {
        let mut message = Message::new("stop");
        message.set(
            COMMANDS,
            json!([{ "command": "CancelFlow", "flow": "order_flow" }]),
            true,
        );

        assert_eq!(
            message.commands().unwrap(),
            vec![Command::CancelFlow {
                flow: "order_flow".to_string()
            }]
        );
    }

    #[test]
    fn test_commands_missing_field_is_empty() {
        assert!(Message::new("hello").commands().unwrap().is_empty());
    }

    #[test]
    fn test_message_serialization_keeps_output_properties() {
        let mut message = Message::new("hello");
        message.set(COMMANDS, json!([]), true);

        let json = serde_json::to_string(&message).unwrap();
        let restored: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, message);
    }
}
