//! LLM Command Generator
//!
//! Renders the message and its context into a prompt, asks a language model for
//! a list of actions such as `StartFlow(order_flow)`, and turns the actions it
//! understands into commands. Actions that reference flows the caller did not
//! supply are dropped.

use crate::{
    command::Command, flows::FlowsList, generator::CommandGenerator, message::Message,
    tracker::DialogueStateTracker,
};
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// The prompt used when no template is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You turn the latest user message of a conversation into actions for a flow-based assistant.

Flows that can be started:
{flows}

Active flow: {current_flow}
Slots filled so far:
{slots}
Slot the assistant asked for: {requested_slot}

User message: """{user_message}"""

Available actions:
StartFlow(flow_id) - start one of the flows listed above
CancelFlow() - cancel the active flow
SetSlot(slot_name, value) - fill a slot with a value from the message
Clarify(flow_id_1, flow_id_2) - ask which of several flows the user means
SearchAndReply() - answer a knowledge question
ChitChat() - reply to small talk
HumanHandoff() - hand the conversation to a human

Reply with the actions to take, one per line, in execution order, and nothing else."#;

/// A text-completion backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `prompt` to the model and returns its text answer.
    async fn complete(&self, prompt: String) -> Result<String>;
}

/// A `CompletionClient` for any OpenAI-compatible chat completion API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the service.
    /// * `model` - The model identifier to use for completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAICompatibleClient {
    async fn complete(&self, prompt: String) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.0)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You are a dialogue understanding component.")
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .clone()
            .context("No content in LLM response")?;
        Ok(answer)
    }
}

/// An action line from the model, e.g. `SetSlot(amount, 50)`.
#[derive(Debug, Clone, PartialEq)]
struct Action {
    name: String,
    raw_args: String,
}

impl Action {
    fn args(&self) -> Vec<String> {
        self.raw_args
            .split(',')
            .map(clean_arg)
            .filter(|arg| !arg.is_empty())
            .collect()
    }
}

fn clean_arg(arg: &str) -> String {
    arg.trim().trim_matches(|c: char| c == '"' || c == '\'').trim().to_string()
}

/// Parses one line of model output. Bullets and surrounding whitespace are ignored.
fn parse_action(line: &str) -> Option<Action> {
    let line = line
        .trim()
        .trim_start_matches(['-', '*'])
        .trim()
        .trim_end_matches(['.', ';']);
    let open = line.find('(')?;
    let raw_args = line[open + 1..].strip_suffix(')')?;
    let name = line[..open].trim();
    if name.is_empty() || !name.chars().all(char::is_alphanumeric) {
        return None;
    }
    Some(Action {
        name: name.to_string(),
        raw_args: raw_args.to_string(),
    })
}

/// Whether `flow` is one of the supplied flows. Without flows, no flow exists.
fn flow_exists(flows: Option<&FlowsList>, flow: &str) -> bool {
    flows.is_some_and(|flows| flows.flow_by_id(flow).is_some())
}

/// What became of a parsed action.
enum Resolution {
    Command(Command),
    /// A known action that does not fit the supplied context.
    Dropped,
    Unknown,
}

/// Converts a parsed action into a command valid for the given context.
fn resolve_action(
    action: &Action,
    tracker: Option<&DialogueStateTracker>,
    flows: Option<&FlowsList>,
) -> Resolution {
    let args = action.args();
    let command = match action.name.as_str() {
        "StartFlow" => args
            .first()
            .filter(|flow| flow_exists(flows, flow))
            .map(|flow| Command::StartFlow { flow: flow.clone() }),
        "CancelFlow" => match args.first() {
            Some(flow)
                if flow_exists(flows, flow)
                    || tracker.and_then(DialogueStateTracker::active_flow)
                        == Some(flow.as_str()) =>
            {
                Some(Command::CancelFlow { flow: flow.clone() })
            }
            Some(_) => None,
            None => tracker
                .and_then(DialogueStateTracker::active_flow)
                .map(|flow| Command::CancelFlow {
                    flow: flow.to_string(),
                }),
        },
        "SetSlot" => {
            let (name, value) = action
                .raw_args
                .split_once(',')
                .unwrap_or((action.raw_args.as_str(), ""));
            let (name, value) = (clean_arg(name), clean_arg(value));
            if name.is_empty() || value.is_empty() {
                None
            } else {
                let value = match value.as_str() {
                    "None" | "null" => Value::Null,
                    _ => Value::String(value),
                };
                Some(Command::SetSlot { name, value })
            }
        }
        "Clarify" => {
            let options: Vec<String> = args
                .into_iter()
                .filter(|flow| flow_exists(flows, flow))
                .collect();
            match options.len() {
                0 => None,
                1 => Some(Command::StartFlow {
                    flow: options[0].clone(),
                }),
                _ => Some(Command::Clarify { options }),
            }
        }
        "ChitChat" => Some(Command::ChitChatAnswer),
        "SearchAndReply" => Some(Command::KnowledgeAnswer),
        "HumanHandoff" => Some(Command::HumanHandoff),
        _ => return Resolution::Unknown,
    };
    command.map_or(Resolution::Dropped, Resolution::Command)
}

/// Turns the model's answer into commands.
///
/// An answer without a single recognizable action becomes `[Error]`.
fn parse_commands(
    answer: &str,
    tracker: Option<&DialogueStateTracker>,
    flows: Option<&FlowsList>,
) -> Vec<Command> {
    let mut recognized = 0;
    let mut commands = Vec::new();
    for action in answer.lines().filter_map(parse_action) {
        match resolve_action(&action, tracker, flows) {
            Resolution::Command(command) => {
                recognized += 1;
                commands.push(command);
            }
            Resolution::Dropped => {
                recognized += 1;
                warn!(action = %action.name, args = %action.raw_args, "Dropping action that does not fit the context");
            }
            Resolution::Unknown => warn!(action = %action.name, "Ignoring unknown action"),
        }
    }
    if recognized == 0 {
        warn!(answer = %answer, "LLM answer contained no usable actions");
        return vec![Command::Error];
    }
    commands
}

/// Fills the template placeholders with the message and its context.
pub fn render_prompt(
    template: &str,
    message: &Message,
    tracker: Option<&DialogueStateTracker>,
    flows: Option<&FlowsList>,
) -> String {
    let flow_lines = match flows {
        Some(flows) if !flows.is_empty() => flows
            .iter()
            .map(|flow| {
                let about = flow
                    .description
                    .as_deref()
                    .or(flow.name.as_deref())
                    .unwrap_or_default();
                if about.is_empty() {
                    flow.id.clone()
                } else {
                    format!("{}: {}", flow.id, about)
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "none".to_string(),
    };

    let slot_lines = tracker
        .filter(|tracker| !tracker.slots.is_empty())
        .map(|tracker| {
            tracker
                .slots
                .iter()
                .map(|(name, value)| match value {
                    Value::String(s) => format!("{name} = {s}"),
                    other => format!("{name} = {other}"),
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_else(|| "none".to_string());

    let current_flow = tracker
        .and_then(DialogueStateTracker::active_flow)
        .unwrap_or("none");
    let requested_slot = tracker
        .and_then(DialogueStateTracker::requested_slot)
        .unwrap_or("none");

    fill_placeholders(
        template,
        &[
            ("flows", flow_lines.as_str()),
            ("current_flow", current_flow),
            ("slots", slot_lines.as_str()),
            ("requested_slot", requested_slot),
            ("user_message", message.text()),
        ],
    )
}

/// Replaces `{name}` placeholders in a single pass, so substituted values are
/// never scanned for placeholders themselves. Unknown placeholders are kept.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        filled.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let matched = values
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match matched {
            Some((name, value)) => {
                filled.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                filled.push('{');
                rest = tail;
            }
        }
    }
    filled.push_str(rest);
    filled
}

/// Predicts commands by prompting a language model.
pub struct LlmCommandGenerator {
    client: Arc<dyn CompletionClient>,
    prompt_template: String,
}

impl LlmCommandGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }
}

#[async_trait]
impl CommandGenerator for LlmCommandGenerator {
    async fn predict_commands(
        &self,
        message: &Message,
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Result<Vec<Command>> {
        let prompt = render_prompt(&self.prompt_template, message, tracker, flows);
        debug!(prompt_chars = prompt.len(), "Requesting actions from LLM");

        let answer = self
            .client
            .complete(prompt)
            .await
            .context("LLM completion request failed")?;

        let commands = parse_commands(&answer, tracker, flows);
        debug!(answer = %answer, commands = ?commands, "Parsed LLM actions");
        Ok(commands)
    }
}
