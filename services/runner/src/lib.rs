//! Batch runner for command generators.
//!
//! Loads configuration and input files, wires the configured generator into a
//! `CommandPipeline`, and renders the processed messages. The `runner` binary is
//! a thin wrapper around this library.

pub mod config;
pub mod input;
pub mod services;
