use super::{MetricResult, ReportDocument, ReportElement};
use crate::aggregate::AggregationTree;
use crate::thresholds::ThresholdEvaluator;
use chrono::{DateTime, Utc};

/// Flatten the tree into report elements, parents before children.
#[must_use]
pub fn build_report(tree: &AggregationTree, evaluator: &ThresholdEvaluator<'_>, generated_at: DateTime<Utc>) -> ReportDocument {
    let elements = tree
        .depth_first()
        .into_iter()
        .map(|id| {
            let node = tree.node(id);
            let statuses = evaluator.evaluate_node(node);

            ReportElement {
                kind: node.kind,
                name: node.name.clone(),
                fully_qualified_name: node.fully_qualified_name.clone(),
                parent_fully_qualified_name: tree.parent_fully_qualified_name(id).to_string(),
                containing_assembly_name: node.containing_assembly_name.clone(),
                member_kind: node.member_kind,
                source: node.source.clone(),
                baseline_status: None,
                metrics: node
                    .metrics
                    .iter()
                    .map(|(metric, value)| {
                        let status = statuses.get(metric).copied().unwrap_or_default();
                        (*metric, MetricResult::new(*value, status))
                    })
                    .collect(),
                suppressions: node.suppressions.clone(),
            }
        })
        .collect();

    ReportDocument {
        solution_name: tree.solution_name().to_string(),
        generated_at,
        elements,
        removed_elements: None,
    }
}
