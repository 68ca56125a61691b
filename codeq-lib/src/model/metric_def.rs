use super::{MetricIdentifier, ParserFamily};

#[derive(Debug)]
pub struct MetricDef {
    pub id: MetricIdentifier,
    pub description: &'static str,
    pub family: ParserFamily,

    /// Short column heading used by the console summary.
    pub label: &'static str,

    /// Whether larger values indicate better code.
    pub higher_is_better: bool,
}

macro_rules! metric_def {
    ($id:ident, $family:ident, $label:expr, $higher_is_better:expr, $description:expr) => {
        MetricDef {
            id: MetricIdentifier::$id,
            description: $description,
            family: ParserFamily::$family,
            label: $label,
            higher_is_better: $higher_is_better,
        }
    };
}

pub const METRIC_DEFINITIONS: &[MetricDef] = &[
    metric_def!(
        OpenCoverSequenceCoverage,
        Coverage,
        "Seq%",
        true,
        "Percentage of sequence points executed by tests"
    ),
    metric_def!(
        OpenCoverBranchCoverage,
        Coverage,
        "Br%",
        true,
        "Percentage of branch points executed by tests, absent when there are no branches"
    ),
    metric_def!(
        OpenCoverCyclomaticComplexity,
        Coverage,
        "CC(cov)",
        false,
        "Cyclomatic complexity as reported by the coverage tool"
    ),
    metric_def!(
        RoslynMaintainabilityIndex,
        Structure,
        "MI",
        true,
        "Maintainability index between 0 and 100"
    ),
    metric_def!(
        RoslynCyclomaticComplexity,
        Structure,
        "CC",
        false,
        "Number of linearly independent paths through the code"
    ),
    metric_def!(
        RoslynClassCoupling,
        Structure,
        "Coupling",
        false,
        "Number of distinct types referenced"
    ),
    metric_def!(
        RoslynDepthOfInheritance,
        Structure,
        "DIT",
        false,
        "Number of classes between the type and the root of its hierarchy"
    ),
    metric_def!(RoslynSourceLines, Structure, "SLOC", false, "Lines of source code"),
    metric_def!(
        RoslynExecutableLines,
        Structure,
        "ELOC",
        false,
        "Lines of executable code"
    ),
    metric_def!(
        SarifCaRuleViolations,
        Findings,
        "CA",
        false,
        "Number of code-analysis (CA) rule violations"
    ),
    metric_def!(
        SarifIdeRuleViolations,
        Findings,
        "IDE",
        false,
        "Number of code-style (IDE) rule violations"
    ),
];
