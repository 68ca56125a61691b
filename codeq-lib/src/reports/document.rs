use crate::model::{CodeElementKind, MemberKind, MetricIdentifier, SourceLocation, SuppressedSymbolInfo};
use crate::thresholds::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::Display;

/// The persisted quality report, also used as the baseline format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportDocument {
    pub solution_name: String,
    pub generated_at: DateTime<Utc>,
    pub elements: Vec<ReportElement>,

    /// Elements of the baseline that no longer exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_elements: Option<Vec<RemovedElement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportElement {
    pub kind: CodeElementKind,
    pub name: String,
    pub fully_qualified_name: String,
    pub parent_fully_qualified_name: String,
    pub containing_assembly_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_kind: Option<MemberKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_status: Option<BaselineStatus>,

    pub metrics: BTreeMap<MetricIdentifier, MetricResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressions: Vec<SuppressedSymbolInfo>,
}

impl ReportElement {
    /// The most severe status among the element's metrics.
    #[must_use]
    pub fn worst_status(&self) -> Status {
        self.metrics.values().map(|result| result.status).max().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricResult {
    pub value: f64,
    pub status: Status,

    /// Current value minus the baseline value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

impl MetricResult {
    #[must_use]
    pub const fn new(value: f64, status: Status) -> Self {
        Self { value, status, delta: None }
    }
}

/// How an element relates to the baseline when it only exists on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum BaselineStatus {
    New,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemovedElement {
    pub kind: CodeElementKind,
    pub fully_qualified_name: String,
}
