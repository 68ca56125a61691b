use super::MetricIdentifier;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter};

/// The level of a program element in the Assembly → Namespace → Type → Member hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum CodeElementKind {
    Assembly,
    Namespace,
    Type,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum MemberKind {
    Method,
    Property,
    Field,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceLocation {
    pub path: Utf8PathBuf,
    pub start_line: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, start_line: u32) -> Self {
        Self {
            path: path.into(),
            start_line,
        }
    }

    /// Compare two source paths independently of separator style and case.
    ///
    /// Tools running on different platforms report the same file with
    /// different separators, and some report paths relative to the solution.
    /// When both paths are rooted they must name the same file. Otherwise a
    /// path matches when one is a suffix of the other on component boundaries.
    #[must_use]
    pub fn same_file(&self, other: &Utf8PathBuf) -> bool {
        let left = path_components(self.path.as_str());
        let right = path_components(other.as_str());
        if is_rooted(self.path.as_str()) && is_rooted(other.as_str()) {
            return !left.is_empty() && left == right;
        }

        let shorter = left.len().min(right.len());
        shorter > 0 && left[left.len() - shorter..] == right[right.len() - shorter..]
    }

    /// Lowercased file name, the part every matching path shares.
    #[must_use]
    pub fn file_key(&self) -> Option<String> {
        file_key(self.path.as_str())
    }
}

/// Lowercased final component of a path written with either separator.
#[must_use]
pub fn file_key(path: &str) -> Option<String> {
    path_components(path).pop()
}

/// Absolute on either platform: `/src`, `\\server\share`, or `C:\src`.
fn is_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with(['/', '\\']) || matches!(bytes, [drive, b':', ..] if drive.is_ascii_alphabetic())
}

fn path_components(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .map(str::to_lowercase)
        .collect()
}

/// One program element as reported by a single input document.
#[derive(Debug, Clone)]
pub struct ParsedCodeElement {
    pub kind: CodeElementKind,
    pub name: String,
    pub fully_qualified_name: String,

    /// FQN of the enclosing element, `None` for assemblies.
    pub parent_fully_qualified_name: Option<String>,
    pub containing_assembly_name: String,
    pub member_kind: Option<MemberKind>,
    pub source: Option<SourceLocation>,
    pub metrics: BTreeMap<MetricIdentifier, f64>,
}

impl ParsedCodeElement {
    #[must_use]
    pub fn new(
        kind: CodeElementKind,
        name: impl Into<String>,
        fully_qualified_name: impl Into<String>,
        parent_fully_qualified_name: Option<String>,
        containing_assembly_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            fully_qualified_name: fully_qualified_name.into(),
            parent_fully_qualified_name,
            containing_assembly_name: containing_assembly_name.into(),
            member_kind: None,
            source: None,
            metrics: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_member_kind(mut self, member_kind: MemberKind) -> Self {
        self.member_kind = Some(member_kind);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<SourceLocation>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, id: MetricIdentifier, value: f64) -> Self {
        let _ = self.metrics.insert(id, value);
        self
    }
}
