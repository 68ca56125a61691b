//! Baseline rotation and trend deltas
//!
//! A baseline is simply an earlier report document. When rotation is requested,
//! the report left by the previous run becomes the baseline before the new report
//! is written, and any older baseline is archived under a timestamped name.
//! Deltas are then computed by matching elements on kind and fully qualified name.

mod differ;
mod rotation;

pub use differ::{DiffSummary, apply_baseline, load_baseline};
pub use rotation::{BaselineState, RotationOutcome, rotate_baseline};
