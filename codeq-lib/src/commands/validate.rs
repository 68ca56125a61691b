use super::Host;
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `codeq.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

/// Loads a configuration file and resolves its thresholds
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or parsed, or if a threshold is invalid
fn validate_config_inner(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<usize> {
    let config = Config::load(base_dir, config_path)?;
    let thresholds = config.thresholds()?;
    Ok(thresholds.len())
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let base_dir = Utf8PathBuf::from(".");
    let config_path = args.config.as_ref();

    match validate_config_inner(&base_dir, config_path) {
        Ok(threshold_count) => {
            let _ = writeln!(host.output(), "Configuration file is valid ({threshold_count} metric threshold(s))");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else {
                let _ = writeln!(host.output(), "Using default configuration (no config file found)");
            }
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::commands::TestHost;
    use crate::commands::init::{InitArgs, init_config};

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_default_config_is_valid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().join("codeq.toml")).unwrap();

        let mut init_host = TestHost::new();
        init_config(&mut init_host, &InitArgs { output: Some(config_path.clone()) }).unwrap();
        assert!(init_host.output_text().contains("Generated default configuration file"));

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_ok(), "Default configuration should validate successfully: {result:?}");
        assert!(host.output_text().contains("Configuration file is valid (6 metric threshold(s))"));
        assert_eq!(host.exit_code, None);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_invalid_toml_syntax() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_config(&temp_dir, "invalid_syntax.toml", "[thresholds.RoslynClassCoupling\ntype = 1\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err(), "Invalid TOML syntax should fail validation");
        assert!(host.error_text().contains("Configuration validation failed"));
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_unknown_field() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_config(&temp_dir, "unknown_field.toml", "unknown_field = \"value\"\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err(), "Unknown field should fail validation");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_unknown_level_field() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_config(
            &temp_dir,
            "unknown_level.toml",
            "[thresholds.RoslynClassCoupling]\nclass = { warning = 1, error = 2 }\n",
        );

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err(), "Unknown threshold level should fail validation");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_warning_stricter_than_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_config(
            &temp_dir,
            "inverted.toml",
            "[thresholds.RoslynMaintainabilityIndex]\nhigher_is_better = true\nmember = { warning = 20, error = 40 }\n",
        );

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err(), "Error threshold looser than warning should fail validation");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_empty_config_is_valid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_config(&temp_dir, "empty.toml", "# Empty config file\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_ok(), "Empty config should be valid (uses defaults)");
        assert!(host.output_text().contains("(0 metric threshold(s))"));
    }
}
