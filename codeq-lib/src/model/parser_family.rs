use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// The kind of tool a document came from.
///
/// The declaration order is the canonical merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum ParserFamily {
    Coverage,
    Structure,
    Findings,
}
