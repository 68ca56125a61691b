use super::Host;
use super::common::{CommonArgs, init_logging};
use super::config::Config;
use crate::Result;
use crate::aggregate::{build_tree, find_symbol_collisions, try_validate_unique_symbols};
use crate::baseline::{apply_baseline, load_baseline, rotate_baseline};
use crate::model::{ParserFamily, SuppressedSymbolInfo};
use crate::parsers::{Cancellation, Collector, InputDocument};
use crate::reports::{ReportDocument, build_report, generate_console, write_json};
use crate::suppressions::{SourceFolder, analyze_source_folders, bind_suppressions, load_cache, save_cache};
use crate::thresholds::ThresholdEvaluator;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use clap::Parser;
use ohno::bail;
use std::io::Write;
use std::sync::Arc;
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "  generate";

const DEFAULT_SOLUTION_NAME: &str = "Solution";

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// OpenCover coverage report
    #[arg(long, value_name = "PATH", help_heading = "Inputs")]
    pub coverage: Vec<Utf8PathBuf>,

    /// Roslyn code metrics report
    #[arg(long, value_name = "PATH", help_heading = "Inputs")]
    pub metrics: Vec<Utf8PathBuf>,

    /// SARIF static-analysis log
    #[arg(long, value_name = "PATH", help_heading = "Inputs")]
    pub sarif: Vec<Utf8PathBuf>,

    /// Where to write the JSON quality report
    #[arg(long, value_name = "PATH", default_value = "codeq-report.json", help_heading = "Report Output")]
    pub report: Utf8PathBuf,

    /// Earlier report to compute deltas against
    #[arg(long, value_name = "PATH", help_heading = "Baseline")]
    pub baseline: Option<Utf8PathBuf>,

    /// Make the previous report the new baseline before writing this one
    #[arg(long, requires = "baseline", help_heading = "Baseline")]
    pub rotate_baseline: bool,

    /// Directory for archived baselines (default is the baseline's directory)
    #[arg(long, value_name = "PATH", requires = "baseline", help_heading = "Baseline")]
    pub archive_dir: Option<Utf8PathBuf>,

    /// Evaluate suppressed metrics like any other
    #[arg(long)]
    pub include_suppressed: bool,

    /// Maximum number of documents parsed at the same time
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub max_concurrency: usize,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl GenerateArgs {
    fn input_documents(&self) -> Vec<InputDocument> {
        let coverage = self.coverage.iter().map(|path| InputDocument::new(ParserFamily::Coverage, path.clone()));
        let metrics = self.metrics.iter().map(|path| InputDocument::new(ParserFamily::Structure, path.clone()));
        let sarif = self.sarif.iter().map(|path| InputDocument::new(ParserFamily::Findings, path.clone()));

        coverage.chain(metrics).chain(sarif).collect()
    }
}

/// Raises the cancellation signal on Ctrl-C until dropped.
struct InterruptGuard(JoinHandle<()>);

impl InterruptGuard {
    fn install(cancel: &Arc<Cancellation>) -> Self {
        let cancel = Arc::clone(cancel);
        Self(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!(target: LOG_TARGET, "Interrupted, stopping");
                cancel.cancel();
            }
        }))
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub async fn generate_report<H: Host>(host: &mut H, args: &GenerateArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let config = Config::load(Utf8Path::new("."), args.common.config.as_ref())?;
    let thresholds = config.thresholds()?;

    let inputs = args.input_documents();
    if inputs.is_empty() {
        bail!("no input documents given; pass at least one of --coverage, --metrics, or --sarif");
    }

    let cancel = Cancellation::new();
    let _interrupt = InterruptGuard::install(&cancel);

    let documents = Collector::new(args.max_concurrency, Arc::clone(&cancel)).collect(&inputs).await?;

    if !try_validate_unique_symbols(&documents) {
        let collisions = find_symbol_collisions(&documents);
        for collision in &collisions {
            let _ = writeln!(
                host.error(),
                "{} symbol '{}' is reported by both '{}' and '{}'",
                collision.family,
                collision.fully_qualified_name,
                collision.first_document,
                collision.second_document
            );
        }

        bail!("{} symbol(s) are reported by more than one document of the same kind", collisions.len());
    }

    let fallback_name = config.solution_name.as_deref().unwrap_or(DEFAULT_SOLUTION_NAME);
    let mut tree = build_tree(&documents, fallback_name);
    log::info!(target: LOG_TARGET, "Merged {} document(s) into {} element(s)", documents.len(), tree.len());

    let source_folders = config.source_folders.clone();
    let suppression_cache = config.suppression_cache.clone();
    let mut suppressions = tokio::task::spawn_blocking(move || discover_suppressions(&source_folders, &suppression_cache)).await?;
    let bound = bind_suppressions(&mut tree, &mut suppressions);
    log::info!(target: LOG_TARGET, "Bound {bound} of {} suppression(s)", suppressions.len());

    let now = Utc::now();
    let evaluator = ThresholdEvaluator::new(&thresholds, args.include_suppressed);
    let report = build_report(&tree, &evaluator, now);

    let outputs = Outputs {
        report,
        report_path: args.report.clone(),
        baseline_path: args.baseline.clone(),
        rotate_baseline: args.rotate_baseline,
        archive_dir: args.archive_dir.clone(),
        suppression_cache: (!config.source_folders.is_empty()).then(|| (config.suppression_cache.clone(), suppressions)),
        now,
    };

    let write_cancel = Arc::clone(&cancel);
    let report = tokio::task::spawn_blocking(move || write_outputs(outputs, &write_cancel)).await??;

    let mut console_output = String::new();
    generate_console(&report, args.common.color.use_colors(), &mut console_output)?;
    console_output.push_str(&format!("\nReport written to {}\n", args.report));
    let _ = write!(host.output(), "{console_output}");

    Ok(())
}

/// Scan the configured source folders, or fall back to the cache from an earlier scan.
fn discover_suppressions(source_folders: &[SourceFolder], suppression_cache: &Utf8Path) -> Vec<SuppressedSymbolInfo> {
    if !source_folders.is_empty() {
        return analyze_source_folders(source_folders);
    }

    match load_cache(suppression_cache) {
        Ok(suppressions) => suppressions,
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Could not read suppression cache '{suppression_cache}': {e:#}");
            Vec::new()
        }
    }
}

/// Everything a run writes to disk, applied only once the run is known to complete.
#[derive(Debug)]
struct Outputs {
    report: ReportDocument,
    report_path: Utf8PathBuf,
    baseline_path: Option<Utf8PathBuf>,
    rotate_baseline: bool,
    archive_dir: Option<Utf8PathBuf>,

    /// Freshly scanned suppressions and where to cache them.
    suppression_cache: Option<(Utf8PathBuf, Vec<SuppressedSymbolInfo>)>,
    now: DateTime<Utc>,
}

/// Save the cache, rotate the baseline, apply deltas, and write the report.
///
/// Nothing is touched when the run was cancelled. Returns the report as written.
fn write_outputs(outputs: Outputs, cancel: &Cancellation) -> Result<ReportDocument> {
    if cancel.is_cancelled() {
        bail!("operation cancelled, no report was written");
    }

    let Outputs {
        mut report,
        report_path,
        baseline_path,
        rotate_baseline: rotate,
        archive_dir,
        suppression_cache,
        now,
    } = outputs;

    if let Some((path, suppressions)) = &suppression_cache {
        save_cache(path, suppressions)?;
    }

    if let Some(baseline_path) = &baseline_path {
        if rotate {
            let _ = rotate_baseline(&report_path, baseline_path, archive_dir.as_deref(), now)?;
        }

        if let Some(baseline) = load_baseline(baseline_path)? {
            let _ = apply_baseline(&mut report, &baseline);
        }
    }

    write_json(&report, &report_path)?;
    Ok(report)
}
