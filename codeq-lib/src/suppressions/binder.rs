use super::rule_map::metric_for_rule_id;
use crate::aggregate::{AggregationTree, NodeId};
use crate::model::{CodeElementKind, SuppressedSymbolInfo};

const LOG_TARGET: &str = "    binder";

/// Attach suppressions to the tree nodes they name.
///
/// A suppression is looked up as a type first and then as a member, accepting
/// `.` in place of the `+` between nested types. One that
/// is not yet bound gets its metric only when the node actually reports the
/// metric its rule maps to. One that is already bound keeps its metric and is
/// attached as-is.
///
/// Returns the number of suppressions bound by this call.
pub fn bind_suppressions(tree: &mut AggregationTree, suppressions: &mut [SuppressedSymbolInfo]) -> usize {
    let mut bound = 0;

    for suppression in suppressions.iter_mut() {
        let Some(id) = locate(tree, &suppression.fully_qualified_name) else {
            log::debug!(
                target: LOG_TARGET,
                "No symbol '{}' for suppression of {}",
                suppression.fully_qualified_name,
                suppression.rule_id
            );
            continue;
        };

        if suppression.metric.is_none() {
            let Some(metric) = metric_for_rule_id(&suppression.rule_id) else {
                continue;
            };

            if !tree.node(id).metrics.contains_key(&metric) {
                log::debug!(
                    target: LOG_TARGET,
                    "'{}' does not report {metric}, suppression of {} left unbound",
                    suppression.fully_qualified_name,
                    suppression.rule_id
                );
                continue;
            }

            suppression.metric = Some(metric);
            bound += 1;
        }

        let node = tree.node_mut(id);
        if !node.suppressions.contains(suppression) {
            node.suppressions.push(suppression.clone());
        }
    }

    log::info!(target: LOG_TARGET, "Bound {bound} of {} suppression(s)", suppressions.len());
    bound
}

fn locate(tree: &AggregationTree, fully_qualified_name: &str) -> Option<NodeId> {
    tree.resolve(CodeElementKind::Type, fully_qualified_name)
        .or_else(|| tree.resolve(CodeElementKind::Member, fully_qualified_name))
}
