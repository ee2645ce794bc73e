//! Command generation for flow-based dialogue.
//!
//! A [`CommandGenerator`] reads a user [`Message`], optionally together with the
//! conversation's [`DialogueStateTracker`] and the available [`FlowsList`], and
//! predicts the [`Command`]s a dialogue engine should execute next. The
//! predictions are attached to the message under [`message::COMMANDS`].

pub mod command;
pub mod error;
pub mod flows;
pub mod generator;
pub mod keyword;
pub mod llm;
pub mod message;
pub mod pipeline;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use command::{Command, CommandRecord, CorrectedSlot};
pub use error::CommandGeneratorError;
pub use flows::{Flow, FlowsList};
pub use generator::{CommandGenerator, encode_commands};
pub use keyword::KeywordCommandGenerator;
pub use llm::{CompletionClient, LlmCommandGenerator, OpenAICompatibleClient};
pub use message::Message;
pub use pipeline::{BatchReport, CommandPipeline, ErrorPolicy, MessageFailure};
pub use tracker::DialogueStateTracker;
