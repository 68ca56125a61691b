use super::{BaselineStatus, ReportDocument, ReportElement};
use crate::Result;
use crate::model::CodeElementKind;
use crate::thresholds::Status;
use core::fmt::Write;
use owo_colors::OwoColorize;
use strum::IntoEnumIterator;

/// Error elements listed individually before the rest are summarized.
const MAX_LISTED_ERRORS: usize = 20;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    elements: usize,
    ok: usize,
    warning: usize,
    error: usize,
}

pub fn generate<W: Write>(report: &ReportDocument, use_colors: bool, writer: &mut W) -> Result<()> {
    let title = format!("Quality report for {}", report.solution_name);
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }
    writeln!(writer)?;

    let name_width = CodeElementKind::iter().map(|kind| kind.to_string().len()).max().unwrap_or(0);
    for kind in CodeElementKind::iter() {
        let tally = tally(report.elements.iter().filter(|element| element.kind == kind));
        if tally.elements == 0 {
            continue;
        }

        writeln!(
            writer,
            "  {:<name_width$}  {:>6}  {} ok, {} warning, {} error",
            kind.to_string(),
            tally.elements,
            paint(tally.ok, Status::Ok, use_colors),
            paint(tally.warning, Status::Warning, use_colors),
            paint(tally.error, Status::Error, use_colors),
        )?;
    }

    let errors: Vec<&ReportElement> = report
        .elements
        .iter()
        .filter(|element| element.worst_status() == Status::Error)
        .collect();

    if !errors.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Errors:")?;

        for element in errors.iter().take(MAX_LISTED_ERRORS) {
            let failing: Vec<String> = element
                .metrics
                .iter()
                .filter(|(_, result)| result.status == Status::Error)
                .map(|(metric, result)| format!("{}={:.2}", metric.definition().label, result.value))
                .collect();

            let marker = if use_colors { "✗".red().bold().to_string() } else { "✗".to_string() };
            writeln!(writer, "  {marker} {} [{}]", element.fully_qualified_name, failing.join(", "))?;
        }

        if errors.len() > MAX_LISTED_ERRORS {
            writeln!(writer, "  ... and {} more", errors.len() - MAX_LISTED_ERRORS)?;
        }
    }

    let new = report
        .elements
        .iter()
        .filter(|element| element.baseline_status == Some(BaselineStatus::New))
        .count();
    let removed = report.removed_elements.as_ref().map_or(0, Vec::len);
    let has_baseline = report
        .elements
        .iter()
        .any(|element| element.metrics.values().any(|result| result.delta.is_some()));

    if has_baseline || new > 0 || removed > 0 {
        writeln!(writer)?;
        writeln!(
            writer,
            "Baseline: {new} new, {removed} removed, {} regressed metric(s)",
            count_regressions(report)
        )?;
    }

    Ok(())
}

fn tally<'a>(elements: impl Iterator<Item = &'a ReportElement>) -> Tally {
    let mut tally = Tally::default();
    for element in elements {
        tally.elements += 1;
        match element.worst_status() {
            Status::Ok => tally.ok += 1,
            Status::Warning => tally.warning += 1,
            Status::Error => tally.error += 1,
        }
    }
    tally
}

fn paint(count: usize, status: Status, use_colors: bool) -> String {
    if !use_colors || count == 0 {
        return count.to_string();
    }

    match status {
        Status::Ok => count.green().to_string(),
        Status::Warning => count.yellow().bold().to_string(),
        Status::Error => count.red().bold().to_string(),
    }
}

/// Metrics whose value moved in the bad direction since the baseline.
fn count_regressions(report: &ReportDocument) -> usize {
    report
        .elements
        .iter()
        .flat_map(|element| element.metrics.iter())
        .filter(|(metric, result)| {
            result.delta.is_some_and(|delta| {
                if metric.definition().higher_is_better {
                    delta < 0.0
                } else {
                    delta > 0.0
                }
            })
        })
        .count()
}
