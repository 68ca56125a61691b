use crate::model::MetricIdentifier;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Suppression categories whose rules this tool understands.
const RECOGNIZED_CATEGORIES: [&str; 2] = ["Microsoft.Maintainability", "Maintainability"];

static RULE_METRICS: LazyLock<HashMap<&'static str, MetricIdentifier>> = LazyLock::new(|| {
    HashMap::from([
        ("CA1501", MetricIdentifier::RoslynDepthOfInheritance),
        ("CA1502", MetricIdentifier::RoslynCyclomaticComplexity),
        ("CA1505", MetricIdentifier::RoslynMaintainabilityIndex),
        ("CA1506", MetricIdentifier::RoslynClassCoupling),
    ])
});

/// The rule id portion of a `checkId[:description]` string.
#[must_use]
pub fn rule_id(check_id: &str) -> &str {
    check_id.split_once(':').map_or(check_id, |(id, _)| id).trim()
}

/// The metric a rule's violations are measured by, if it is a known rule.
#[must_use]
pub fn metric_for_rule_id(rule_id: &str) -> Option<MetricIdentifier> {
    RULE_METRICS.get(rule_id.trim()).copied()
}

/// The metric a suppression annotation applies to.
///
/// Returns `None` when the category or the rule is not recognized.
#[must_use]
pub fn metric_for_suppression(category: &str, check_id: &str) -> Option<MetricIdentifier> {
    if !RECOGNIZED_CATEGORIES.contains(&category.trim()) {
        return None;
    }

    metric_for_rule_id(rule_id(check_id))
}
