use super::{MetricDef, ParserFamily, metric_def::METRIC_DEFINITIONS};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// One measurement the system understands.
///
/// Serialized names are the variant names, both in reports and in the
/// configuration file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
pub enum MetricIdentifier {
    OpenCoverSequenceCoverage,
    OpenCoverBranchCoverage,
    OpenCoverCyclomaticComplexity,
    RoslynMaintainabilityIndex,
    RoslynCyclomaticComplexity,
    RoslynClassCoupling,
    RoslynDepthOfInheritance,
    RoslynSourceLines,
    RoslynExecutableLines,
    SarifCaRuleViolations,
    SarifIdeRuleViolations,
}

impl MetricIdentifier {
    /// The registry entry for this identifier.
    #[must_use]
    pub fn definition(self) -> &'static MetricDef {
        METRIC_DEFINITIONS
            .iter()
            .find(|def| def.id == self)
            .unwrap_or_else(|| unreachable!("every metric identifier has a definition"))
    }

    #[must_use]
    pub fn family(self) -> ParserFamily {
        self.definition().family
    }

    /// All identifiers populated by the given parser family.
    pub fn owned_by(family: ParserFamily) -> impl Iterator<Item = Self> {
        Self::iter().filter(move |id| id.family() == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_every_identifier_has_exactly_one_definition() {
        for id in MetricIdentifier::iter() {
            let count = METRIC_DEFINITIONS.iter().filter(|def| def.id == id).count();
            assert_eq!(count, 1, "{id} should be registered exactly once");
        }
        assert_eq!(METRIC_DEFINITIONS.len(), MetricIdentifier::iter().count());
    }

    #[test]
    fn test_families_are_disjoint() {
        let coverage: Vec<_> = MetricIdentifier::owned_by(ParserFamily::Coverage).collect();
        let structure: Vec<_> = MetricIdentifier::owned_by(ParserFamily::Structure).collect();
        let findings: Vec<_> = MetricIdentifier::owned_by(ParserFamily::Findings).collect();

        assert_eq!(coverage.len(), 3);
        assert_eq!(structure.len(), 6);
        assert_eq!(findings.len(), 2);
        assert!(coverage.iter().all(|id| !structure.contains(id) && !findings.contains(id)));
    }

    #[test]
    fn test_display_and_parse_use_variant_names() {
        assert_eq!(MetricIdentifier::RoslynClassCoupling.to_string(), "RoslynClassCoupling");
        assert_eq!(
            MetricIdentifier::from_str("SarifCaRuleViolations").unwrap(),
            MetricIdentifier::SarifCaRuleViolations
        );
        let _ = MetricIdentifier::from_str("Unknown").unwrap_err();
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MetricIdentifier::OpenCoverBranchCoverage).unwrap();
        assert_eq!(json, "\"OpenCoverBranchCoverage\"");
    }
}
