//! Command Generator Contract
//!
//! A command generator turns a user message, plus whatever conversation context
//! is available, into the ordered list of commands the dialogue engine should
//! execute. Rule-based, model-based and hybrid strategies all sit behind the same
//! trait and are chosen by whoever builds the pipeline.

use crate::{
    command::Command,
    error::CommandGeneratorError,
    flows::FlowsList,
    message::{COMMANDS, Message},
    tracker::DialogueStateTracker,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Defines the contract for any strategy that predicts commands from messages.
///
/// Implementations take `&self` and receive all context per call, so a generator
/// holds configuration only. Given the same message, tracker and flows, it must
/// predict the same commands.
#[async_trait]
pub trait CommandGenerator: Send + Sync {
    /// Predicts commands for a single message.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to predict commands for.
    /// * `tracker` - The conversation state up to now. `None` on the first turn or
    ///   in stateless use; the prediction must then rely on the message alone.
    /// * `flows` - The flows commands may reference. `None` means no flow exists.
    ///
    /// # Returns
    ///
    /// The commands in the order they should be executed, possibly empty.
    async fn predict_commands(
        &self,
        message: &Message,
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Result<Vec<Command>>;

    /// Predicts commands for every message and attaches them under [`COMMANDS`].
    ///
    /// Messages are handled in order and mutated in place; the returned slice is
    /// the one passed in. The first failed prediction aborts the batch, leaving
    /// later messages untouched. Use [`crate::pipeline::CommandPipeline`] for
    /// per-message isolation.
    async fn process<'a>(
        &self,
        messages: &'a mut [Message],
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Result<&'a mut [Message], CommandGeneratorError> {
        for (index, message) in messages.iter_mut().enumerate() {
            let commands = self
                .predict_commands(message, tracker, flows)
                .await
                .map_err(|source| CommandGeneratorError::Prediction { index, source })?;
            attach_commands(message, &commands)?;
        }
        Ok(messages)
    }
}

/// Serializes `commands` into a list of tagged records.
pub fn encode_commands(commands: &[Command]) -> serde_json::Result<Value> {
    commands
        .iter()
        .map(|command| command.to_record().map(Value::Object))
        .collect::<serde_json::Result<Vec<_>>>()
        .map(Value::Array)
}

/// Writes the encoded commands to the message's output field.
pub(crate) fn attach_commands(
    message: &mut Message,
    commands: &[Command],
) -> Result<(), CommandGeneratorError> {
    let records = encode_commands(commands)?;
    message.set(COMMANDS, records, true);
    Ok(())
}
