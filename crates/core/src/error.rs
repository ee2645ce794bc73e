/// Errors surfaced while running a command generator over a batch of messages.
#[derive(Debug, thiserror::Error)]
pub enum CommandGeneratorError {
    /// The generator failed to predict commands for the message at `index`.
    #[error("command prediction failed for message {index}: {source}")]
    Prediction {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    /// The predicted commands could not be turned into records.
    #[error("failed to encode predicted commands: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CommandGeneratorError {
    /// Index of the message that failed, if the failure belongs to one message.
    pub fn message_index(&self) -> Option<usize> {
        match self {
            CommandGeneratorError::Prediction { index, .. } => Some(*index),
            CommandGeneratorError::Encode(_) => None,
        }
    }
}
