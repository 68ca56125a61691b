use crate::Result;
use crate::reports::copy_file;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

const LOG_TARGET: &str = "  rotation";

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// What exists on disk before a run writes its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineState {
    NoBaselineNoPriorReport,
    NoBaselinePriorReportExists,
    BaselineExists,
}

impl BaselineState {
    #[must_use]
    pub fn detect(report_path: &Utf8Path, baseline_path: &Utf8Path) -> Self {
        if baseline_path.is_file() {
            Self::BaselineExists
        } else if report_path.is_file() {
            Self::NoBaselinePriorReportExists
        } else {
            Self::NoBaselineNoPriorReport
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    pub state: BaselineState,

    /// Whether the prior report became the new baseline.
    pub baseline_replaced: bool,

    /// Where the previous baseline was archived, if it was.
    pub archived_to: Option<Utf8PathBuf>,
}

/// Promote the prior report to be the baseline before a new report replaces it.
///
/// An existing baseline is first copied into `archive_dir` (the baseline's own
/// directory by default) under a timestamped name. Archiving is best-effort: a
/// failure is logged and rotation continues.
///
/// # Errors
///
/// Returns an error if the prior report cannot be copied over the baseline.
pub fn rotate_baseline(
    report_path: &Utf8Path,
    baseline_path: &Utf8Path,
    archive_dir: Option<&Utf8Path>,
    now: DateTime<Utc>,
) -> Result<RotationOutcome> {
    let state = BaselineState::detect(report_path, baseline_path);
    let mut outcome = RotationOutcome {
        state,
        baseline_replaced: false,
        archived_to: None,
    };

    match state {
        BaselineState::NoBaselineNoPriorReport => {
            log::debug!(target: LOG_TARGET, "No prior report at '{report_path}', nothing to rotate");
        }
        BaselineState::NoBaselinePriorReportExists => {
            copy_file(report_path, baseline_path)?;
            outcome.baseline_replaced = true;
            log::info!(target: LOG_TARGET, "Created baseline '{baseline_path}' from '{report_path}'");
        }
        BaselineState::BaselineExists if !report_path.is_file() => {
            log::debug!(target: LOG_TARGET, "No prior report at '{report_path}', keeping baseline '{baseline_path}'");
        }
        BaselineState::BaselineExists => {
            let destination = archive_path(baseline_path, archive_dir, now);
            match copy_file(baseline_path, &destination) {
                Ok(()) => {
                    log::info!(target: LOG_TARGET, "Archived baseline '{baseline_path}' to '{destination}'");
                    outcome.archived_to = Some(destination);
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not archive baseline '{baseline_path}': {e:#}");
                }
            }

            copy_file(report_path, baseline_path)?;
            outcome.baseline_replaced = true;
            log::info!(target: LOG_TARGET, "Replaced baseline '{baseline_path}' with '{report_path}'");
        }
    }

    Ok(outcome)
}

/// `<archive_dir>/<stem>-<YYYYMMDDTHHMMSSZ>.json`, with a counter appended if taken.
fn archive_path(baseline_path: &Utf8Path, archive_dir: Option<&Utf8Path>, now: DateTime<Utc>) -> Utf8PathBuf {
    let directory = archive_dir
        .or_else(|| baseline_path.parent())
        .unwrap_or_else(|| Utf8Path::new("."));
    let stem = baseline_path.file_stem().unwrap_or("baseline");
    let timestamp = now.format(ARCHIVE_TIMESTAMP_FORMAT);

    let candidate = directory.join(format!("{stem}-{timestamp}.json"));
    if !candidate.exists() {
        return candidate;
    }

    (1..)
        .map(|counter| directory.join(format!("{stem}-{timestamp}-{counter}.json")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_nothing_to_rotate() {
        let (_guard, dir) = temp_dir();
        let outcome = rotate_baseline(&dir.join("report.json"), &dir.join("baseline.json"), None, now()).unwrap();

        assert_eq!(outcome.state, BaselineState::NoBaselineNoPriorReport);
        assert!(!outcome.baseline_replaced);
        assert!(!dir.join("baseline.json").exists());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_prior_report_becomes_baseline() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join("report.json"), "run 1").unwrap();

        let outcome = rotate_baseline(&dir.join("report.json"), &dir.join("baseline.json"), None, now()).unwrap();

        assert_eq!(outcome.state, BaselineState::NoBaselinePriorReportExists);
        assert!(outcome.baseline_replaced);
        assert_eq!(outcome.archived_to, None);
        assert_eq!(fs::read_to_string(dir.join("baseline.json")).unwrap(), "run 1");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_existing_baseline_is_archived() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join("report.json"), "run 2").unwrap();
        fs::write(dir.join("baseline.json"), "run 1").unwrap();
        let archive = dir.join("archive");

        let outcome = rotate_baseline(&dir.join("report.json"), &dir.join("baseline.json"), Some(&archive), now()).unwrap();

        assert_eq!(outcome.state, BaselineState::BaselineExists);
        assert!(outcome.baseline_replaced);
        let archived = outcome.archived_to.unwrap();
        assert_eq!(archived, archive.join("baseline-20240309T070501Z.json"));
        assert_eq!(fs::read_to_string(archived).unwrap(), "run 1");
        assert_eq!(fs::read_to_string(dir.join("baseline.json")).unwrap(), "run 2");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_baseline_without_prior_report_is_kept() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join("baseline.json"), "run 1").unwrap();

        let outcome = rotate_baseline(&dir.join("report.json"), &dir.join("baseline.json"), None, now()).unwrap();

        assert_eq!(outcome.state, BaselineState::BaselineExists);
        assert!(!outcome.baseline_replaced);
        assert_eq!(outcome.archived_to, None);
        assert_eq!(fs::read_to_string(dir.join("baseline.json")).unwrap(), "run 1");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_archive_name_collision_gets_counter() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join("baseline-20240309T070501Z.json"), "older").unwrap();

        let path = archive_path(&dir.join("baseline.json"), None, now());
        assert_eq!(path, dir.join("baseline-20240309T070501Z-1.json"));
    }
}
