//! Report documents, safe file writes, and console output
//!
//! The report is the merged tree flattened into a list of elements, each with
//! its metric values, threshold status, and trend against the baseline. The
//! same JSON shape is read back as the baseline of a later run.
//!
//! # Implementation Model
//!
//! - [`build_report`] turns the tree and an evaluator into a [`ReportDocument`].
//! - Deltas against a baseline are filled in afterwards by the `baseline` module.
//! - Every file is written through [`write_with`], which writes a temporary file
//!   next to the destination and atomically moves it into place.
//! - [`generate_console`] prints a short colored summary for humans.

mod builder;
mod console;
mod document;
mod scoped_write;

pub use builder::build_report;
pub use console::generate as generate_console;
pub use document::{BaselineStatus, MetricResult, RemovedElement, ReportDocument, ReportElement};
pub use scoped_write::{copy_file, load_json, write_json, write_with};
