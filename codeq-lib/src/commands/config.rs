use crate::Result;
use crate::model::MetricIdentifier;
use crate::suppressions::SourceFolder;
use crate::thresholds::{MetricThresholdDefinition, Thresholds};
use camino::{Utf8Path, Utf8PathBuf};
use core::str::FromStr;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when no configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "codeq.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Solution name used when no input document provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_name: Option<String>,

    /// Folders scanned for suppression attributes
    #[serde(default)]
    pub source_folders: Vec<SourceFolder>,

    /// Location of the suppressed-symbols cache
    #[serde(default = "default_suppression_cache")]
    pub suppression_cache: Utf8PathBuf,

    /// Threshold definitions keyed by metric identifier
    #[serde(default)]
    pub thresholds: BTreeMap<String, MetricThresholdDefinition>,
}

fn default_suppression_cache() -> Utf8PathBuf {
    Utf8PathBuf::from("codeq-suppressions.json")
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading codeq configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    let mut config = Self::default();
                    config.resolve_paths(base_dir);
                    return Ok(config);
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading codeq configuration file '{path}'")),
            }
        };

        let mut config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        let config_dir = final_path.parent().filter(|dir| !dir.as_str().is_empty()).unwrap_or(base_dir);
        config.resolve_paths(config_dir);

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Threshold definitions with their metric names resolved
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown metric name or an inconsistent definition
    pub fn thresholds(&self) -> Result<Thresholds> {
        let mut definitions = BTreeMap::new();
        for (name, definition) in &self.thresholds {
            let metric = MetricIdentifier::from_str(name).map_err(|e| app_err!("unknown metric '{name}' in thresholds: {e}"))?;
            let _ = definitions.insert(metric, definition.clone());
        }

        Thresholds::new(definitions)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a threshold is invalid or a source folder is unusable
    pub fn validate(&self) -> Result<()> {
        let _ = self.thresholds()?;

        for folder in &self.source_folders {
            if folder.path.as_str().trim().is_empty() {
                return Err(app_err!("source folder paths must not be empty"));
            }

            if folder.assembly.as_deref().is_some_and(|name| name.trim().is_empty()) {
                return Err(app_err!("source folder '{}' has an empty assembly name", folder.path));
            }
        }

        if self.suppression_cache.as_str().trim().is_empty() {
            return Err(app_err!("suppression_cache must not be empty"));
        }

        Ok(())
    }

    fn resolve_paths(&mut self, dir: &Utf8Path) {
        for folder in &mut self.source_folders {
            if folder.path.is_relative() {
                folder.path = dir.join(&folder.path);
            }
        }

        if self.suppression_cache.is_relative() {
            self.suppression_cache = dir.join(&self.suppression_cache);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CodeElementKind;
    use crate::thresholds::Status;

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert!(config.source_folders.is_empty());
        assert_eq!(config.solution_name, None);
    }

    #[test]
    fn test_default_thresholds_resolve() {
        let thresholds = Config::default().thresholds().unwrap();

        assert_eq!(
            thresholds.evaluate(CodeElementKind::Member, MetricIdentifier::RoslynCyclomaticComplexity, 20.0),
            Status::Error
        );
        assert_eq!(
            thresholds.evaluate(CodeElementKind::Type, MetricIdentifier::RoslynMaintainabilityIndex, 40.0),
            Status::Warning
        );
        assert_eq!(
            thresholds.evaluate(CodeElementKind::Member, MetricIdentifier::RoslynSourceLines, 10_000.0),
            Status::Ok
        );
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let config: Config = toml::from_str("[thresholds.NotAMetric]\nmember = { warning = 1, error = 2 }\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("NotAMetric"));
    }

    #[test]
    fn test_inverted_threshold_is_rejected() {
        let config: Config = toml::from_str("[thresholds.RoslynClassCoupling]\ntype = { warning = 80, error = 40 }\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: core::result::Result<Config, _> = toml::from_str("unknown_field = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_assembly_name_is_rejected() {
        let config: Config = toml::from_str("[[source_folders]]\npath = \"src\"\nassembly = \" \"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_save_default_and_load() {
        let (_guard, dir) = temp_dir();
        let output_path = dir.join(DEFAULT_CONFIG_FILE);
        Config::save_default(&output_path).unwrap();

        let loaded = Config::load(&dir, Some(&output_path)).unwrap();
        loaded.validate().unwrap();
        assert_eq!(loaded.suppression_cache, dir.join("codeq-suppressions.json"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_load_missing_config_uses_defaults() {
        let (_guard, dir) = temp_dir();
        let config = Config::load(&dir, None).unwrap();
        assert_eq!(config.suppression_cache, dir.join("codeq-suppressions.json"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_relative_paths_resolve_against_config_dir() {
        let (_guard, dir) = temp_dir();
        let config_dir = dir.join("settings");
        fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("custom.toml");
        fs::write(
            &config_path,
            "suppression_cache = \"cache.json\"\n\n[[source_folders]]\npath = \"../src/Core\"\nassembly = \"Contoso.Core\"\n",
        )
        .unwrap();

        let config = Config::load(&dir, Some(&config_path)).unwrap();
        assert_eq!(config.suppression_cache, config_dir.join("cache.json"));
        assert_eq!(config.source_folders[0].path, config_dir.join("../src/Core"));
        assert_eq!(config.source_folders[0].assembly_name(), "Contoso.Core");
        assert!(config.thresholds.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_missing_explicit_config_fails() {
        let (_guard, dir) = temp_dir();
        let path = dir.join("absent.toml");
        assert!(Config::load(&dir, Some(&path)).is_err());
    }
}
