use super::{MetricIdentifier, ParsedCodeElement, ParserFamily};
use camino::Utf8PathBuf;

/// A finding whose tool did not name the symbol it belongs to.
///
/// These are attributed to a tree node by source position during merge.
#[derive(Debug, Clone, PartialEq)]
pub struct UnattributedFinding {
    pub path: Utf8PathBuf,
    pub line: u32,
    pub rule_id: String,
    pub metric: MetricIdentifier,
}

/// The flat result of parsing one input document.
#[derive(Debug, Clone)]
pub struct ParsedMetricsDocument {
    pub source_path: Option<Utf8PathBuf>,
    pub family: ParserFamily,

    /// Solution name reported by the document, if the format carries one.
    pub solution_name: Option<String>,
    pub elements: Vec<ParsedCodeElement>,
    pub unattributed_findings: Vec<UnattributedFinding>,
}

impl ParsedMetricsDocument {
    #[must_use]
    pub const fn new(source_path: Option<Utf8PathBuf>, family: ParserFamily) -> Self {
        Self {
            source_path,
            family,
            solution_name: None,
            elements: Vec::new(),
            unattributed_findings: Vec::new(),
        }
    }

    /// A human-readable identifier for diagnostics.
    ///
    /// Documents built in memory have no path and are identified by their
    /// position in the input list instead.
    #[must_use]
    pub fn display_id(&self, ordinal: usize) -> String {
        self.source_path
            .as_ref()
            .map_or_else(|| format!("<document #{ordinal}>"), ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_id() {
        let named = ParsedMetricsDocument::new(Some("cov/a.xml".into()), ParserFamily::Coverage);
        let unnamed = ParsedMetricsDocument::new(None, ParserFamily::Coverage);

        assert_eq!(named.display_id(0), "cov/a.xml");
        assert_eq!(unnamed.display_id(2), "<document #2>");
    }
}
