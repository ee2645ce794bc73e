//! Generators used by the unit tests in this crate.

use crate::{
    command::Command, flows::FlowsList, generator::CommandGenerator, message::Message,
    tracker::DialogueStateTracker,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns a fixed list of commands per message text and counts its calls.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: HashMap<String, Vec<Command>>,
    calls: AtomicUsize,
    calls_with_context: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn with(mut self, text: &str, commands: Vec<Command>) -> Self {
        self.script.insert(text.to_string(), commands);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_with_context(&self) -> usize {
        self.calls_with_context.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandGenerator for ScriptedGenerator {
    async fn predict_commands(
        &self,
        message: &Message,
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Result<Vec<Command>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if tracker.is_some() && flows.is_some() {
            self.calls_with_context.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.script.get(message.text()).cloned().unwrap_or_default())
    }
}

/// Fails on one specific text and answers with chit-chat otherwise.
pub struct FailingGenerator {
    trigger: String,
    calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandGenerator for FailingGenerator {
    async fn predict_commands(
        &self,
        message: &Message,
        _tracker: Option<&DialogueStateTracker>,
        _flows: Option<&FlowsList>,
    ) -> Result<Vec<Command>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if message.text() == self.trigger {
            bail!("cannot handle '{}'", self.trigger);
        }
        Ok(vec![Command::ChitChatAnswer])
    }
}

/// Sleeps for the number of milliseconds stored in the `delay_ms` field, then
/// starts a flow named after the message text.
pub struct DelayedEchoGenerator;

#[async_trait]
impl CommandGenerator for DelayedEchoGenerator {
    async fn predict_commands(
        &self,
        message: &Message,
        _tracker: Option<&DialogueStateTracker>,
        _flows: Option<&FlowsList>,
    ) -> Result<Vec<Command>> {
        let delay = message
            .get("delay_ms")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![
            Command::StartFlow {
                flow: message.text().to_string(),
            },
            Command::ChitChatAnswer,
        ])
    }
}
