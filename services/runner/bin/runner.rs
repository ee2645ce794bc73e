//! Main Entrypoint for the Command Runner
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and arguments from the command line.
//! 2. Reading the message batch and the optional flows and tracker.
//! 3. Building the configured command generator and pipeline.
//! 4. Printing every processed message as a JSON line on stdout.

use anyhow::Context;
use cdu_runner::{
    config::Config,
    input::{load_flows, load_messages, load_tracker},
    services::{build_generator, build_pipeline, render_output},
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

/// Predict dialogue commands for a batch of messages.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON array or JSON lines file with the messages to process.
    #[arg(long)]
    messages: PathBuf,
    /// JSON file with the flows commands may reference.
    #[arg(long)]
    flows: Option<PathBuf>,
    /// JSON file with the conversation state up to now.
    #[arg(long)]
    tracker: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 3. Load Input ---
    let mut messages = load_messages(&args.messages)?;
    let flows = args.flows.as_deref().map(load_flows).transpose()?;
    let tracker = args.tracker.as_deref().map(load_tracker).transpose()?;
    info!(
        messages = messages.len(),
        flows = flows.as_ref().map_or(0, |f| f.len()),
        has_tracker = tracker.is_some(),
        "Input loaded."
    );

    // --- 4. Run the Pipeline ---
    let generator = build_generator(&config)?;
    let pipeline = build_pipeline(&config, generator);
    let report = pipeline
        .run(&mut messages, tracker.as_ref(), flows.as_ref())
        .await
        .context("Command prediction failed")?;

    for failure in &report.failures {
        warn!(index = failure.index, error = %failure.error, "Message left without commands");
    }

    // --- 5. Print Results ---
    println!("{}", render_output(&messages)?);
    info!(
        processed = report.processed,
        failed = report.failures.len(),
        "Done."
    );
    Ok(())
}
