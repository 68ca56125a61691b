use serde::{Deserialize, Serialize};
use strum::Display;

/// Classification of one metric value against its thresholds.
///
/// Ordered by severity, so the worst status of a set is its maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Ok,
    Warning,
    Error,
}
