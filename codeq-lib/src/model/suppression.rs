use super::MetricIdentifier;
use serde::{Deserialize, Serialize};

/// A source-level acknowledgement that a rule violation on a symbol is accepted.
///
/// `metric` stays `None` until the binder finds a tree node that reports the
/// metric the rule maps to. Once bound it is never replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SuppressedSymbolInfo {
    pub fully_qualified_name: String,
    pub rule_id: String,
    pub metric: Option<MetricIdentifier>,
    pub justification: Option<String>,
}

impl SuppressedSymbolInfo {
    #[must_use]
    pub fn new(fully_qualified_name: impl Into<String>, rule_id: impl Into<String>, justification: Option<String>) -> Self {
        Self {
            fully_qualified_name: fully_qualified_name.into(),
            rule_id: rule_id.into(),
            metric: None,
            justification,
        }
    }
}
