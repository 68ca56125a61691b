//! Command-line interface and orchestration for codeq
//!
//! This module implements the CLI commands and drives the rest of the library
//! end to end: parse the input documents, validate and merge them, bind
//! suppressions, evaluate thresholds, compare against a baseline, and write the
//! report.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **generate**: Build a quality report from coverage, code metrics, and SARIF documents
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and threshold consistency
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler. `generate` then:
//!
//! 1. Loads the configuration and resolves its thresholds
//! 2. Parses every input document concurrently, honoring Ctrl-C
//! 3. Rejects inputs that report the same symbol twice
//! 4. Merges the documents into one tree
//! 5. Scans sources (or reads the cache) for suppressions and binds them
//! 6. Rotates the baseline when asked to
//! 7. Evaluates thresholds and computes deltas against the baseline
//! 8. Writes the report atomically and prints a console summary
//!
//! Configuration is managed through a TOML file holding the solution name,
//! the source folders to scan, and per-metric thresholds.

mod common;
mod config;
mod generate;
mod host;
mod init;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use generate::{GenerateArgs, generate_report};
pub use host::Host;
#[cfg(test)]
pub use host::TestHost;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
