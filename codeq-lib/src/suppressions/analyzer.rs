use super::rule_map::{metric_for_suppression, rule_id};
use super::scanner::scan_source;
use crate::model::SuppressedSymbolInfo;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;

const LOG_TARGET: &str = "suppressions";

/// Source files larger than this are generated code and are not scanned.
const MAX_FILE_SIZE: u64 = 5_000_000;

/// A directory of C# sources that belong to one assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceFolder {
    pub path: Utf8PathBuf,

    /// Defaults to the folder's own name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
}

impl SourceFolder {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, assembly: Option<String>) -> Self {
        Self {
            path: path.into(),
            assembly,
        }
    }

    /// The assembly the folder's sources are compiled into.
    #[must_use]
    pub fn assembly_name(&self) -> &str {
        self.assembly
            .as_deref()
            .or_else(|| self.path.file_name())
            .unwrap_or(self.path.as_str())
    }
}

/// Find every recognized suppression declared in the configured source folders.
///
/// Scan failures are not fatal. A folder, directory entry, or file that
/// cannot be read is logged and skipped, and the rest of the sources are
/// still scanned. Files that are not valid UTF-8 are decoded lossily, which
/// keeps the ASCII attribute syntax intact.
#[must_use]
pub fn analyze_source_folders(folders: &[SourceFolder]) -> Vec<SuppressedSymbolInfo> {
    let files = collect_source_files(folders);

    let mut suppressions = Vec::new();
    let mut per_assembly: BTreeMap<&str, usize> = BTreeMap::new();

    for (path, folder) in &files {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping source file '{path}' that could not be read: {e}");
                continue;
            }
        };

        let source = String::from_utf8_lossy(&bytes);
        if matches!(source, Cow::Owned(_)) {
            log::debug!(target: LOG_TARGET, "Source file '{path}' is not valid UTF-8, decoding lossily");
        }

        for found in scan_source(&source) {
            if metric_for_suppression(&found.category, &found.check_id).is_none() {
                log::trace!(
                    target: LOG_TARGET,
                    "Ignoring {} suppression '{}' on '{}'",
                    found.category,
                    found.check_id,
                    found.fully_qualified_name
                );
                continue;
            }

            suppressions.push(SuppressedSymbolInfo::new(
                found.fully_qualified_name,
                rule_id(&found.check_id),
                found.justification,
            ));
            *per_assembly.entry(folder.assembly_name()).or_default() += 1;
        }
    }

    for (assembly, count) in &per_assembly {
        log::info!(target: LOG_TARGET, "Found {count} suppression(s) in assembly '{assembly}'");
    }

    suppressions.sort_by(|a, b| {
        a.fully_qualified_name
            .cmp(&b.fully_qualified_name)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
    suppressions.dedup_by(|a, b| a.fully_qualified_name == b.fully_qualified_name && a.rule_id == b.rule_id);

    log::debug!(target: LOG_TARGET, "Scanned {} source file(s), {} suppression(s)", files.len(), suppressions.len());
    suppressions
}

/// Every `.cs` file under the folders, paired with the most specific folder containing it.
fn collect_source_files(folders: &[SourceFolder]) -> BTreeMap<Utf8PathBuf, &SourceFolder> {
    let mut files: BTreeMap<Utf8PathBuf, &SourceFolder> = BTreeMap::new();

    for folder in folders {
        if !folder.path.is_dir() {
            log::warn!(target: LOG_TARGET, "Skipping source folder '{}' that does not exist", folder.path);
            continue;
        }

        for entry_result in walkdir::WalkDir::new(&folder.path).follow_links(false) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Skipping unreadable entry in source folder '{}': {e}", folder.path);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let is_source = entry.path().extension().and_then(|s| s.to_str()) == Some("cs");
            if !is_source {
                continue;
            }

            let size = entry.metadata().map_or(0, |metadata| metadata.len());
            if size > MAX_FILE_SIZE {
                log::debug!(target: LOG_TARGET, "Skipping large file '{}' ({size} bytes)", entry.path().display());
                continue;
            }

            let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => path,
                Err(path) => {
                    log::warn!(target: LOG_TARGET, "Skipping source file '{}' whose path is not valid UTF-8", path.display());
                    continue;
                }
            };

            match files.entry(path) {
                Entry::Vacant(vacant) => {
                    let _ = vacant.insert(folder);
                }
                Entry::Occupied(mut occupied) => {
                    if depth(&folder.path) > depth(&occupied.get().path) {
                        let _ = occupied.insert(folder);
                    }
                }
            }
        }
    }

    files
}

fn depth(path: &Utf8Path) -> usize {
    path.components().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Utf8Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    const STARTUP: &str = r#"
        namespace Contoso.Core
        {
            [SuppressMessage("Microsoft.Maintainability", "CA1506:AvoidExcessiveClassCoupling", Justification = "Composition root")]
            public class Startup
            {
                [SuppressMessage("Microsoft.Design", "CA1062")]
                public void Configure(object services) { }
            }
        }
    "#;

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_type_suppression_is_found() {
        let (_guard, root) = temp_root();
        write(&root, "Core/Startup.cs", STARTUP);
        write(&root, "Core/README.md", "[SuppressMessage(\"Maintainability\", \"CA1502\")] class Nope {}");

        let found = analyze_source_folders(&[SourceFolder::new(root.join("Core"), None)]);
        assert_eq!(
            found,
            vec![SuppressedSymbolInfo {
                fully_qualified_name: "Contoso.Core.Startup".into(),
                rule_id: "CA1506".into(),
                metric: None,
                justification: Some("Composition root".into()),
            }]
        );
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_overlapping_folders_scan_each_file_once() {
        let (_guard, root) = temp_root();
        write(&root, "src/Core/Startup.cs", STARTUP);

        let folders = [
            SourceFolder::new(root.join("src"), Some("Everything".into())),
            SourceFolder::new(root.join("src").join("Core"), None),
        ];

        let files = collect_source_files(&folders);
        assert_eq!(files.len(), 1);
        assert_eq!(files.values().next().unwrap().assembly_name(), "Core");

        assert_eq!(analyze_source_folders(&folders).len(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_missing_folder_degrades_to_empty() {
        let (_guard, root) = temp_root();
        let found = analyze_source_folders(&[SourceFolder::new(root.join("missing"), None)]);
        assert!(found.is_empty());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri does not support file system operations")]
    fn test_undecodable_file_does_not_hide_other_suppressions() {
        let (_guard, root) = temp_root();
        write(&root, "A/Good.cs", "[SuppressMessage(\"Maintainability\", \"CA1506\")] class Good { }");

        // Latin-1 encoded source: 0xE9 is not valid UTF-8 on its own
        let latin1 = b"// caf\xE9\n[SuppressMessage(\"Maintainability\", \"CA1502\")] class Latin { }\n";
        fs::create_dir_all(root.join("B")).unwrap();
        fs::write(root.join("B").join("Latin.cs"), latin1).unwrap();

        let folders = [
            SourceFolder::new(root.join("A"), None),
            SourceFolder::new(root.join("B"), None),
            SourceFolder::new(root.join("missing"), None),
        ];

        let found: Vec<(String, String)> = analyze_source_folders(&folders)
            .into_iter()
            .map(|s| (s.fully_qualified_name, s.rule_id))
            .collect();
        assert_eq!(
            found,
            vec![("Good".to_string(), "CA1506".to_string()), ("Latin".to_string(), "CA1502".to_string())]
        );
    }

    #[test]
    fn test_assembly_name() {
        assert_eq!(SourceFolder::new("src/Contoso.Core", None).assembly_name(), "Contoso.Core");
        assert_eq!(SourceFolder::new("src/Core", Some("Contoso.Core".into())).assembly_name(), "Contoso.Core");
    }
}
