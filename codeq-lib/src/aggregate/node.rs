use crate::model::{CodeElementKind, MemberKind, MetricIdentifier, SourceLocation, SuppressedSymbolInfo};
use std::collections::BTreeMap;

/// Index of a node within an [`AggregationTree`](super::AggregationTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(super) usize);

/// One program element, merged from every document that reports it.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: CodeElementKind,
    pub name: String,
    pub fully_qualified_name: String,

    /// `None` for assemblies, which hang directly off the solution.
    pub parent: Option<NodeId>,
    pub containing_assembly_name: String,
    pub member_kind: Option<MemberKind>,
    pub source: Option<SourceLocation>,
    pub metrics: BTreeMap<MetricIdentifier, f64>,
    pub suppressions: Vec<SuppressedSymbolInfo>,
    pub children: Vec<NodeId>,

    /// Created only to give a reported element an ancestor.
    pub synthesized: bool,
}

impl TreeNode {
    pub(super) fn new(kind: CodeElementKind, name: String, fully_qualified_name: String, containing_assembly_name: String) -> Self {
        Self {
            kind,
            name,
            fully_qualified_name,
            parent: None,
            containing_assembly_name,
            member_kind: None,
            source: None,
            metrics: BTreeMap::new(),
            suppressions: Vec::new(),
            children: Vec::new(),
            synthesized: true,
        }
    }

    /// Whether a bound suppression on this node covers `metric`.
    #[must_use]
    pub fn is_suppressed(&self, metric: MetricIdentifier) -> bool {
        self.suppressions.iter().any(|s| s.metric == Some(metric))
    }
}
