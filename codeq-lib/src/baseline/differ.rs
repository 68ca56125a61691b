use crate::Result;
use crate::model::{CodeElementKind, MetricIdentifier};
use crate::reports::{BaselineStatus, MetricResult, RemovedElement, ReportDocument, load_json};
use camino::Utf8Path;
use std::collections::{BTreeMap, HashSet};

const LOG_TARGET: &str = "  baseline";

/// Counts of what changed relative to the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub compared: usize,
    pub new: usize,
    pub removed: usize,
}

/// Load a baseline report, or `None` if there is none yet.
///
/// # Errors
///
/// Returns an error if the file exists but is not a report document.
pub fn load_baseline(path: &Utf8Path) -> Result<Option<ReportDocument>> {
    if !path.is_file() {
        return Ok(None);
    }

    load_json(path).map(Some)
}

/// Fill in deltas, `New` markers, and removed elements from a baseline.
///
/// Deltas are `current - baseline` for metrics present on both sides of an
/// element present on both sides. An element on one side only gets no deltas.
pub fn apply_baseline(report: &mut ReportDocument, baseline: &ReportDocument) -> DiffSummary {
    let previous: BTreeMap<(CodeElementKind, &str), &BTreeMap<MetricIdentifier, MetricResult>> = baseline
        .elements
        .iter()
        .map(|element| ((element.kind, element.fully_qualified_name.as_str()), &element.metrics))
        .collect();

    let mut summary = DiffSummary::default();
    let mut present: HashSet<(CodeElementKind, &str)> = HashSet::with_capacity(report.elements.len());

    for element in &mut report.elements {
        let key = (element.kind, element.fully_qualified_name.as_str());
        let _ = present.insert(key);

        let Some(old_metrics) = previous.get(&key) else {
            element.baseline_status = Some(BaselineStatus::New);
            summary.new += 1;
            continue;
        };

        summary.compared += 1;
        element.baseline_status = None;
        for (metric, result) in &mut element.metrics {
            result.delta = old_metrics.get(metric).map(|old| result.value - old.value);
        }
    }

    let removed: Vec<RemovedElement> = baseline
        .elements
        .iter()
        .filter(|element| !present.contains(&(element.kind, element.fully_qualified_name.as_str())))
        .map(|element| RemovedElement {
            kind: element.kind,
            fully_qualified_name: element.fully_qualified_name.clone(),
        })
        .collect();

    summary.removed = removed.len();
    report.removed_elements = (!removed.is_empty()).then_some(removed);

    log::info!(
        target: LOG_TARGET,
        "Compared {} element(s) with the baseline: {} new, {} removed",
        summary.compared,
        summary.new,
        summary.removed
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::ReportElement;
    use crate::thresholds::Status;
    use chrono::{TimeZone, Utc};

    fn element(kind: CodeElementKind, fqn: &str, metrics: &[(MetricIdentifier, f64)]) -> ReportElement {
        ReportElement {
            kind,
            name: fqn.into(),
            fully_qualified_name: fqn.into(),
            parent_fully_qualified_name: String::new(),
            containing_assembly_name: "Asm".into(),
            member_kind: None,
            source: None,
            baseline_status: None,
            metrics: metrics
                .iter()
                .map(|(metric, value)| (*metric, MetricResult::new(*value, Status::Ok)))
                .collect(),
            suppressions: Vec::new(),
        }
    }

    fn document(elements: Vec<ReportElement>) -> ReportDocument {
        ReportDocument {
            solution_name: "S".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            elements,
            removed_elements: None,
        }
    }

    #[test]
    fn test_deltas_new_and_removed() {
        let baseline = document(vec![
            element(
                CodeElementKind::Type,
                "N.Widget",
                &[(MetricIdentifier::RoslynClassCoupling, 40.0), (MetricIdentifier::RoslynDepthOfInheritance, 2.0)],
            ),
            element(CodeElementKind::Member, "N.Widget.Stop(...)", &[(MetricIdentifier::RoslynCyclomaticComplexity, 3.0)]),
        ]);

        let mut current = document(vec![
            element(
                CodeElementKind::Type,
                "N.Widget",
                &[(MetricIdentifier::RoslynClassCoupling, 45.0), (MetricIdentifier::RoslynSourceLines, 120.0)],
            ),
            element(CodeElementKind::Member, "N.Widget.Run(...)", &[(MetricIdentifier::RoslynCyclomaticComplexity, 7.0)]),
        ]);

        let summary = apply_baseline(&mut current, &baseline);
        assert_eq!(summary, DiffSummary { compared: 1, new: 1, removed: 1 });

        let widget = &current.elements[0];
        assert_eq!(widget.baseline_status, None);
        assert_eq!(widget.metrics[&MetricIdentifier::RoslynClassCoupling].delta, Some(5.0));
        assert_eq!(widget.metrics[&MetricIdentifier::RoslynSourceLines].delta, None);

        let run = &current.elements[1];
        assert_eq!(run.baseline_status, Some(BaselineStatus::New));
        assert_eq!(run.metrics[&MetricIdentifier::RoslynCyclomaticComplexity].delta, None);

        assert_eq!(
            current.removed_elements,
            Some(vec![RemovedElement {
                kind: CodeElementKind::Member,
                fully_qualified_name: "N.Widget.Stop(...)".into(),
            }])
        );
    }

    #[test]
    fn test_same_name_different_kind_is_distinct() {
        let baseline = document(vec![element(CodeElementKind::Namespace, "Contoso", &[])]);
        let mut current = document(vec![element(CodeElementKind::Assembly, "Contoso", &[])]);

        let summary = apply_baseline(&mut current, &baseline);
        assert_eq!(summary, DiffSummary { compared: 0, new: 1, removed: 1 });
    }

    #[test]
    fn test_identical_reports_have_zero_deltas() {
        let baseline = document(vec![element(CodeElementKind::Type, "N.Widget", &[(MetricIdentifier::RoslynClassCoupling, 40.0)])]);
        let mut current = baseline.clone();

        let summary = apply_baseline(&mut current, &baseline);
        assert_eq!(summary, DiffSummary { compared: 1, new: 0, removed: 0 });
        assert_eq!(current.elements[0].metrics[&MetricIdentifier::RoslynClassCoupling].delta, Some(0.0));
        assert_eq!(current.removed_elements, None);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_missing_baseline_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("baseline.json")).unwrap();
        assert_eq!(load_baseline(&path).unwrap(), None);
    }
}
