//! Ok/Warning/Error classification of metric values
//!
//! Each metric may define a warning and an error boundary per tree level.
//! The metric's direction decides which side of a boundary is bad, and a
//! value exactly on a boundary is classified into the worse bucket. Metrics
//! without a definition for a level are always `Ok`, and metrics a bound
//! suppression covers are reported as `Ok` unless suppressed values are
//! explicitly requested.

mod definition;
mod evaluator;
mod status;

pub use definition::{MetricThresholdDefinition, ThresholdLevel};
pub use evaluator::{ThresholdEvaluator, Thresholds, classify};
pub use status::Status;
