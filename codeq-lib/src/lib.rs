#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for codeq
//!
//! This library consolidates all functionality for the codeq tool, which merges
//! test coverage, structural code metrics, and static-analysis findings about a
//! .NET solution into a single hierarchical quality report.
//!
//! # Module Organization
//!
//! - [`symbols`]: Canonical symbol names shared by every input dialect
//! - [`model`]: Parsed elements, metric identifiers, and documents
//! - [`parsers`]: Readers for the coverage, code metrics, and findings formats
//! - [`aggregate`]: Cross-document validation and the merged symbol tree
//! - [`suppressions`]: Source-level suppression discovery and binding
//! - [`thresholds`]: Ok/Warning/Error classification of metric values
//! - [`baseline`]: Baseline rotation and trend deltas
//! - [`reports`]: Report documents, safe file writes, and console output
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod aggregate;
pub mod baseline;
pub mod model;
pub mod parsers;
pub mod reports;
pub mod suppressions;
pub mod symbols;
pub mod thresholds;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
