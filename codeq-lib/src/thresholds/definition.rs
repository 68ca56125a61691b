use crate::Result;
use crate::model::{CodeElementKind, MetricIdentifier};
use ohno::bail;
use serde::{Deserialize, Serialize};

/// The two boundaries of one metric at one tree level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdLevel {
    pub warning: f64,
    pub error: f64,
}

impl ThresholdLevel {
    #[must_use]
    pub const fn new(warning: f64, error: f64) -> Self {
        Self { warning, error }
    }
}

/// Per-level thresholds for one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricThresholdDefinition {
    /// Defaults to the metric's natural direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub higher_is_better: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<ThresholdLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<ThresholdLevel>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_level: Option<ThresholdLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<ThresholdLevel>,
}

impl MetricThresholdDefinition {
    /// The thresholds that apply to elements of `kind`.
    #[must_use]
    pub const fn level(&self, kind: CodeElementKind) -> Option<&ThresholdLevel> {
        match kind {
            CodeElementKind::Assembly => self.assembly.as_ref(),
            CodeElementKind::Namespace => self.namespace.as_ref(),
            CodeElementKind::Type => self.type_level.as_ref(),
            CodeElementKind::Member => self.member.as_ref(),
        }
    }

    /// Whether larger values of `metric` are better under this definition.
    #[must_use]
    pub fn higher_is_better(&self, metric: MetricIdentifier) -> bool {
        self.higher_is_better.unwrap_or(metric.definition().higher_is_better)
    }

    /// Check that every level is finite and that its error boundary is at
    /// least as strict as its warning boundary.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first inconsistent level.
    pub fn validate(&self, metric: MetricIdentifier) -> Result<()> {
        let higher_is_better = self.higher_is_better(metric);
        let levels = [
            (CodeElementKind::Assembly, self.assembly),
            (CodeElementKind::Namespace, self.namespace),
            (CodeElementKind::Type, self.type_level),
            (CodeElementKind::Member, self.member),
        ];

        for (kind, level) in levels {
            let Some(level) = level else {
                continue;
            };

            if !level.warning.is_finite() || !level.error.is_finite() {
                bail!("thresholds for {metric} at {kind} level must be finite numbers");
            }

            if higher_is_better && level.error > level.warning {
                bail!(
                    "error threshold ({}) for {metric} at {kind} level must not be above the warning threshold ({}) when higher is better",
                    level.error,
                    level.warning
                );
            }

            if !higher_is_better && level.error < level.warning {
                bail!(
                    "error threshold ({}) for {metric} at {kind} level must not be below the warning threshold ({}) when lower is better",
                    level.error,
                    level.warning
                );
            }
        }

        Ok(())
    }
}
