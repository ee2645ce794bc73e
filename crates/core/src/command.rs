//! Dialogue Commands
//!
//! Commands are the output of a command generator: small, plain records that a
//! downstream dialogue engine executes in order. Every variant serializes to a
//! flat JSON object carrying a `command` discriminator next to its fields, so a
//! consumer can dispatch on the kind without knowing the generator that made it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the variant name is stored in a serialized command record.
pub const COMMAND_KEY: &str = "command";

/// A serialized command: the command's fields plus the `command` discriminator.
pub type CommandRecord = Map<String, Value>;

/// A slot value that replaces a previously filled one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedSlot {
    pub name: String,
    pub value: Value,
}

/// Represents an instruction for the dialogue engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Command {
    /// Push the named flow onto the conversation.
    StartFlow { flow: String },
    /// Abort the named flow.
    CancelFlow { flow: String },
    /// Fill a slot with a value taken from the user's message.
    SetSlot { name: String, value: Value },
    /// Overwrite slots that were filled earlier in the conversation.
    CorrectSlots { corrected_slots: Vec<CorrectedSlot> },
    /// Ask the user to pick between several candidate flows.
    Clarify { options: Vec<String> },
    /// Answer with small talk; no flow is involved.
    ChitChatAnswer,
    /// Answer from a knowledge source; no flow is involved.
    KnowledgeAnswer,
    /// Hand the conversation over to a human.
    HumanHandoff,
    /// The generator could not make sense of the message.
    Error,
}

impl Command {
    /// Returns the discriminator stored under [`COMMAND_KEY`].
    pub fn kind(&self) -> &'static str {
        match self {
            Command::StartFlow { .. } => "StartFlow",
            Command::CancelFlow { .. } => "CancelFlow",
            Command::SetSlot { .. } => "SetSlot",
            Command::CorrectSlots { .. } => "CorrectSlots",
            Command::Clarify { .. } => "Clarify",
            Command::ChitChatAnswer => "ChitChatAnswer",
            Command::KnowledgeAnswer => "KnowledgeAnswer",
            Command::HumanHandoff => "HumanHandoff",
            Command::Error => "Error",
        }
    }

    /// Decomposes the command into its field-value record.
    ///
    /// The record holds every field of the variant and the discriminator, so
    /// [`Command::from_record`] restores the same command.
    pub fn to_record(&self) -> serde_json::Result<CommandRecord> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(serde::ser::Error::custom(format!(
                "command serialized to a non-object value: {other}"
            ))),
        }
    }

    /// Rebuilds a command from a record produced by [`Command::to_record`].
    pub fn from_record(record: CommandRecord) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(record))
    }
}
