//! Parsed elements, metric identifiers, and documents
//!
//! Every parser produces the same flat representation: a
//! [`ParsedMetricsDocument`] holding [`ParsedCodeElement`] values whose
//! metrics are keyed by [`MetricIdentifier`]. The aggregation layer consumes
//! documents and never looks at the original input formats.
//!
//! # Implementation Model
//!
//! Metric identifiers form a closed set. Each identifier is owned by exactly
//! one [`ParserFamily`], which is what makes merging documents from different
//! tools a disjoint union. The static definition table in `metric_def.rs` is
//! the single registry for descriptions, ownership, and the natural direction
//! of each measurement.

mod code_element;
mod document;
mod metric_def;
mod metric_id;
mod parser_family;
mod suppression;

pub use code_element::{CodeElementKind, MemberKind, ParsedCodeElement, SourceLocation, file_key};
pub use document::{ParsedMetricsDocument, UnattributedFinding};
pub use metric_def::MetricDef;
pub use metric_id::MetricIdentifier;
pub use parser_family::ParserFamily;
pub use suppression::SuppressedSymbolInfo;
