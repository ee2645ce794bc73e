//! Batch Orchestration
//!
//! `CommandPipeline` runs an injected generator over a batch with an explicit
//! failure policy and an optional level of concurrency. However many predictions
//! run at once, results are applied to messages in input order, so the outcome
//! is the same as processing the batch one message at a time.

use crate::{
    command::Command,
    error::CommandGeneratorError,
    flows::FlowsList,
    generator::{CommandGenerator, attach_commands},
    message::Message,
    tracker::DialogueStateTracker,
};
use futures::{StreamExt, stream};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// What the pipeline does when a prediction fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first failure and return it.
    #[default]
    FailFast,
    /// Skip failed messages, report them, and keep going.
    CollectErrors,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "fail_fast" => Ok(ErrorPolicy::FailFast),
            "collect-errors" | "collect_errors" => Ok(ErrorPolicy::CollectErrors),
            other => Err(format!(
                "'{other}' is not an error policy (expected 'fail-fast' or 'collect-errors')"
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::FailFast => write!(f, "fail-fast"),
            ErrorPolicy::CollectErrors => write!(f, "collect-errors"),
        }
    }
}

/// A prediction failure isolated under [`ErrorPolicy::CollectErrors`].
#[derive(Debug)]
pub struct MessageFailure {
    pub index: usize,
    pub error: anyhow::Error,
}

/// Outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of messages that had commands attached.
    pub processed: usize,
    /// Messages left untouched because their prediction failed.
    pub failures: Vec<MessageFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CommandPipeline {
    generator: Arc<dyn CommandGenerator>,
    error_policy: ErrorPolicy,
    concurrency: usize,
}

impl CommandPipeline {
    /// Creates a sequential, fail-fast pipeline around `generator`.
    pub fn new(generator: Arc<dyn CommandGenerator>) -> Self {
        Self {
            generator,
            error_policy: ErrorPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Sets how many predictions may be in flight at once. Values below 1 are
    /// treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Predicts and attaches commands for every message in `messages`.
    ///
    /// Under [`ErrorPolicy::FailFast`] the first failure (in input order) is
    /// returned and no message after it is modified. Under
    /// [`ErrorPolicy::CollectErrors`] failed messages are left untouched and
    /// listed in the report.
    pub async fn run(
        &self,
        messages: &mut [Message],
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Result<BatchReport, CommandGeneratorError> {
        if messages.is_empty() {
            return Ok(BatchReport::default());
        }

        info!(
            batch_size = messages.len(),
            error_policy = %self.error_policy,
            concurrency = self.concurrency,
            has_tracker = tracker.is_some(),
            flow_count = flows.map_or(0, FlowsList::len),
            "Predicting commands for batch"
        );

        let predictions = self.predict_all(messages, tracker, flows).await;

        let mut report = BatchReport::default();
        for (index, (message, prediction)) in messages.iter_mut().zip(predictions).enumerate() {
            match prediction {
                Ok(commands) => {
                    attach_commands(message, &commands)?;
                    report.processed += 1;
                }
                Err(source) => {
                    warn!(index, error = %source, "Command prediction failed");
                    match self.error_policy {
                        ErrorPolicy::FailFast => {
                            return Err(CommandGeneratorError::Prediction { index, source });
                        }
                        ErrorPolicy::CollectErrors => {
                            report.failures.push(MessageFailure {
                                index,
                                error: source,
                            });
                        }
                    }
                }
            }
        }

        info!(
            processed = report.processed,
            failed = report.failures.len(),
            "Batch complete"
        );
        Ok(report)
    }

    /// Runs the predictions, yielding results in input order. Under fail-fast the
    /// returned list ends at the first failure.
    async fn predict_all(
        &self,
        messages: &[Message],
        tracker: Option<&DialogueStateTracker>,
        flows: Option<&FlowsList>,
    ) -> Vec<anyhow::Result<Vec<Command>>> {
        let generator = self.generator.as_ref();
        let mut results = stream::iter(messages.iter())
            .map(|message| generator.predict_commands(message, tracker, flows))
            .buffered(self.concurrency);

        let mut predictions = Vec::with_capacity(messages.len());
        while let Some(prediction) = results.next().await {
            let failed = prediction.is_err();
            predictions.push(prediction);
            if failed && self.error_policy == ErrorPolicy::FailFast {
                break;
            }
        }
        predictions
    }
}
