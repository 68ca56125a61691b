use super::{MetricThresholdDefinition, Status, ThresholdLevel};
use crate::Result;
use crate::aggregate::TreeNode;
use crate::model::{CodeElementKind, MetricIdentifier};
use std::collections::BTreeMap;

/// Classify a value against a pair of boundaries.
///
/// A value exactly on a boundary falls into the stricter bucket.
#[must_use]
pub fn classify(value: f64, level: &ThresholdLevel, higher_is_better: bool) -> Status {
    if higher_is_better {
        if value <= level.error {
            Status::Error
        } else if value <= level.warning {
            Status::Warning
        } else {
            Status::Ok
        }
    } else if value >= level.error {
        Status::Error
    } else if value >= level.warning {
        Status::Warning
    } else {
        Status::Ok
    }
}

/// The configured thresholds for every metric, validated.
#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    definitions: BTreeMap<MetricIdentifier, MetricThresholdDefinition>,
}

impl Thresholds {
    /// # Errors
    ///
    /// Returns an error if any definition is inconsistent.
    pub fn new(definitions: BTreeMap<MetricIdentifier, MetricThresholdDefinition>) -> Result<Self> {
        for (metric, definition) in &definitions {
            definition.validate(*metric)?;
        }

        Ok(Self { definitions })
    }

    /// Number of metrics with a definition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[must_use]
    pub fn definition(&self, metric: MetricIdentifier) -> Option<&MetricThresholdDefinition> {
        self.definitions.get(&metric)
    }

    /// Status of `value` for `metric` on an element of `kind`; `Ok` when no threshold applies.
    #[must_use]
    pub fn evaluate(&self, kind: CodeElementKind, metric: MetricIdentifier, value: f64) -> Status {
        self.definition(metric)
            .and_then(|definition| {
                definition
                    .level(kind)
                    .map(|level| classify(value, level, definition.higher_is_better(metric)))
            })
            .unwrap_or_default()
    }
}

/// Applies thresholds to tree nodes, honoring bound suppressions.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdEvaluator<'a> {
    thresholds: &'a Thresholds,
    include_suppressed: bool,
}

impl<'a> ThresholdEvaluator<'a> {
    /// With `include_suppressed`, suppressed metrics are classified like any other.
    #[must_use]
    pub const fn new(thresholds: &'a Thresholds, include_suppressed: bool) -> Self {
        Self {
            thresholds,
            include_suppressed,
        }
    }

    #[must_use]
    pub fn evaluate(&self, node: &TreeNode, metric: MetricIdentifier, value: f64) -> Status {
        if !self.include_suppressed && node.is_suppressed(metric) {
            return Status::Ok;
        }

        self.thresholds.evaluate(node.kind, metric, value)
    }

    /// Status of every metric the node reports.
    #[must_use]
    pub fn evaluate_node(&self, node: &TreeNode) -> BTreeMap<MetricIdentifier, Status> {
        node.metrics
            .iter()
            .map(|(metric, value)| (*metric, self.evaluate(node, *metric, *value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::build_tree;
    use crate::model::{ParsedCodeElement, ParsedMetricsDocument, ParserFamily, SuppressedSymbolInfo};
    use crate::suppressions::bind_suppressions;

    const COMPLEXITY: ThresholdLevel = ThresholdLevel::new(10.0, 20.0);
    const MAINTAINABILITY: ThresholdLevel = ThresholdLevel::new(50.0, 20.0);

    #[test]
    fn test_lower_is_better_boundaries() {
        assert_eq!(classify(9.99, &COMPLEXITY, false), Status::Ok);
        assert_eq!(classify(10.0, &COMPLEXITY, false), Status::Warning);
        assert_eq!(classify(19.99, &COMPLEXITY, false), Status::Warning);
        assert_eq!(classify(20.0, &COMPLEXITY, false), Status::Error);
        assert_eq!(classify(250.0, &COMPLEXITY, false), Status::Error);
    }

    #[test]
    fn test_higher_is_better_boundaries() {
        assert_eq!(classify(50.01, &MAINTAINABILITY, true), Status::Ok);
        assert_eq!(classify(50.0, &MAINTAINABILITY, true), Status::Warning);
        assert_eq!(classify(20.01, &MAINTAINABILITY, true), Status::Warning);
        assert_eq!(classify(20.0, &MAINTAINABILITY, true), Status::Error);
        assert_eq!(classify(0.0, &MAINTAINABILITY, true), Status::Error);
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(BTreeMap::from([(
            MetricIdentifier::RoslynClassCoupling,
            MetricThresholdDefinition {
                type_level: Some(ThresholdLevel::new(40.0, 80.0)),
                ..MetricThresholdDefinition::default()
            },
        )]))
        .unwrap()
    }

    #[test]
    fn test_missing_definition_or_level_is_ok() {
        let thresholds = thresholds();
        assert_eq!(
            thresholds.evaluate(CodeElementKind::Type, MetricIdentifier::RoslynCyclomaticComplexity, 1_000.0),
            Status::Ok
        );
        assert_eq!(
            thresholds.evaluate(CodeElementKind::Member, MetricIdentifier::RoslynClassCoupling, 1_000.0),
            Status::Ok
        );
        assert_eq!(
            thresholds.evaluate(CodeElementKind::Type, MetricIdentifier::RoslynClassCoupling, 80.0),
            Status::Error
        );
    }

    #[test]
    fn test_inconsistent_definition_is_rejected() {
        let result = Thresholds::new(BTreeMap::from([(
            MetricIdentifier::RoslynCyclomaticComplexity,
            MetricThresholdDefinition {
                member: Some(ThresholdLevel::new(20.0, 10.0)),
                ..MetricThresholdDefinition::default()
            },
        )]));
        let _ = result.unwrap_err();
    }

    #[test]
    fn test_suppressed_metric_is_ok_unless_included() {
        let mut document = ParsedMetricsDocument::new(None, ParserFamily::Structure);
        document.elements = vec![
            ParsedCodeElement::new(CodeElementKind::Type, "Startup", "N.Startup", Some("N".into()), "Asm")
                .with_metric(MetricIdentifier::RoslynClassCoupling, 95.0),
        ];
        let mut tree = build_tree(&[document], "S");
        let mut suppressions = vec![SuppressedSymbolInfo::new("N.Startup", "CA1506", None)];
        assert_eq!(bind_suppressions(&mut tree, &mut suppressions), 1);

        let thresholds = thresholds();
        let node = tree.node(tree.find(CodeElementKind::Type, "N.Startup").unwrap());

        let statuses = ThresholdEvaluator::new(&thresholds, false).evaluate_node(node);
        assert_eq!(statuses[&MetricIdentifier::RoslynClassCoupling], Status::Ok);

        let statuses = ThresholdEvaluator::new(&thresholds, true).evaluate_node(node);
        assert_eq!(statuses[&MetricIdentifier::RoslynClassCoupling], Status::Error);
    }
}
