//! Reader for SARIF 2.1.0 static-analysis logs.
//!
//! Only .NET analyzer rules are kept: ids starting with `CA` count as
//! code-analysis violations and ids starting with `IDE` as code-style
//! violations. Results are counted per symbol when the tool names the symbol
//! through a logical location, and kept as unattributed findings otherwise.

use super::MetricsParser;
use crate::Result;
use crate::model::{
    CodeElementKind, MemberKind, MetricIdentifier, ParsedCodeElement, ParsedMetricsDocument, ParserFamily,
    UnattributedFinding,
};
use crate::symbols::{
    GLOBAL_NAMESPACE, UNKNOWN_ASSEMBLY, extract_method_name, normalize_fully_qualified_method_name,
    normalize_qualified_type_name, simple_type_name,
};
use camino::{Utf8Path, Utf8PathBuf};
use ohno::IntoAppError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const LOG_TARGET: &str = "  findings";

/// Rule id prefixes that are retained, and the metric each one feeds.
const RULE_PREFIXES: &[(&str, MetricIdentifier)] = &[
    ("CA", MetricIdentifier::SarifCaRuleViolations),
    ("IDE", MetricIdentifier::SarifIdeRuleViolations),
];

#[derive(Debug, Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Debug, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Deserialize)]
struct SarifDriver {
    #[serde(default)]
    name: String,
    #[serde(default)]
    rules: Vec<SarifRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    short_description: Option<SarifMessage>,
    #[serde(default)]
    full_description: Option<SarifMessage>,
    #[serde(default)]
    help_uri: Option<String>,
    #[serde(default)]
    properties: Option<SarifRuleProperties>,
}

#[derive(Debug, Deserialize)]
struct SarifRuleProperties {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SarifMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    rule_index: Option<usize>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    #[serde(default)]
    physical_location: Option<SarifPhysicalLocation>,
    #[serde(default)]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    #[serde(default)]
    artifact_location: Option<SarifArtifactLocation>,
    #[serde(default)]
    region: Option<SarifRegion>,
}

#[derive(Debug, Deserialize)]
struct SarifArtifactLocation {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    #[serde(default)]
    start_line: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifLogicalLocation {
    #[serde(default)]
    fully_qualified_name: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// A retained entry of a tool's rule catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub id: String,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub help_uri: Option<String>,
    pub category: Option<String>,
    pub metric: MetricIdentifier,
}

/// The metric fed by a rule id, or `None` for rules outside the recognized families.
#[must_use]
pub fn metric_for_rule(rule_id: &str) -> Option<MetricIdentifier> {
    RULE_PREFIXES
        .iter()
        .find(|(prefix, _)| {
            rule_id
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .map(|(_, metric)| *metric)
}

fn build_catalog(driver: &SarifDriver) -> Vec<Option<RuleDescriptor>> {
    driver
        .rules
        .iter()
        .map(|rule| {
            let id = rule.id.as_deref()?.trim();
            let metric = metric_for_rule(id)?;
            Some(RuleDescriptor {
                id: id.to_string(),
                short_description: rule.short_description.as_ref().map(|m| m.text.clone()),
                full_description: rule.full_description.as_ref().map(|m| m.text.clone()),
                help_uri: rule.help_uri.clone(),
                category: rule.properties.as_ref().and_then(|p| p.category.clone()),
                metric,
            })
        })
        .collect()
}

/// Parser for SARIF 2.1.0 JSON logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FindingsParser;

impl MetricsParser for FindingsParser {
    const FAMILY: ParserFamily = ParserFamily::Findings;

    fn parse_content(&self, content: &str, source_path: Option<&Utf8Path>) -> Result<ParsedMetricsDocument> {
        let display = source_path.map_or("<inline>", Utf8Path::as_str);
        let log: SarifLog =
            serde_json::from_str(content).into_app_err_with(|| format!("malformed SARIF document '{display}'"))?;

        let mut document = ParsedMetricsDocument::new(source_path.map(Utf8Path::to_path_buf), Self::FAMILY);
        let mut counts: BTreeMap<(CodeElementKind, String), BTreeMap<MetricIdentifier, u32>> = BTreeMap::new();

        for run in &log.runs {
            let catalog = build_catalog(&run.tool.driver);
            let by_id: HashMap<&str, &RuleDescriptor> =
                catalog.iter().flatten().map(|rule| (rule.id.as_str(), rule)).collect();

            log::debug!(
                target: LOG_TARGET,
                "Run of '{}' in '{display}' declares {} recognized rules",
                run.tool.driver.name,
                by_id.len()
            );

            for result in &run.results {
                if result.level.as_deref() == Some("none") {
                    continue;
                }

                let rule_id = result
                    .rule_id
                    .as_deref()
                    .map(str::trim)
                    .or_else(|| result.rule_index.and_then(|index| catalog.get(index)?.as_ref()).map(|rule| rule.id.as_str()));
                let Some(rule_id) = rule_id else {
                    continue;
                };

                let Some(metric) = by_id.get(rule_id).map(|rule| rule.metric).or_else(|| metric_for_rule(rule_id)) else {
                    continue;
                };

                match logical_symbol(result) {
                    Some(key) => {
                        *counts.entry(key).or_default().entry(metric).or_default() += 1;
                    }
                    None => match physical_location(result) {
                        Some((path, line)) => document.unattributed_findings.push(UnattributedFinding {
                            path,
                            line,
                            rule_id: rule_id.to_string(),
                            metric,
                        }),
                        None => {
                            log::debug!(target: LOG_TARGET, "Dropping {rule_id} result in '{display}' without any location");
                        }
                    },
                }
            }
        }

        document.elements = counts
            .into_iter()
            .map(|((kind, fqn), metrics)| symbol_element(kind, fqn, metrics))
            .collect();

        log::debug!(
            target: LOG_TARGET,
            "Parsed {} symbols and {} unattributed findings from SARIF document '{display}'",
            document.elements.len(),
            document.unattributed_findings.len()
        );

        Ok(document)
    }
}

/// The normalized symbol a result names through its logical locations.
fn logical_symbol(result: &SarifResult) -> Option<(CodeElementKind, String)> {
    result
        .locations
        .iter()
        .flat_map(|location| &location.logical_locations)
        .find_map(|logical| {
            let fqn = logical.fully_qualified_name.as_deref()?.trim();
            if fqn.is_empty() {
                return None;
            }

            Some(match logical.kind.as_deref() {
                Some("type") => (CodeElementKind::Type, normalize_qualified_type_name(fqn)),
                Some("namespace") => (CodeElementKind::Namespace, fqn.to_string()),
                _ => (CodeElementKind::Member, normalize_fully_qualified_method_name(fqn)),
            })
        })
}

fn physical_location(result: &SarifResult) -> Option<(Utf8PathBuf, u32)> {
    result.locations.iter().find_map(|location| {
        let physical = location.physical_location.as_ref()?;
        let uri = physical.artifact_location.as_ref()?.uri.as_deref()?;
        let line = physical.region.as_ref()?.start_line?;
        Some((uri_to_path(uri), line))
    })
}

/// Turn a `file://` URI or a plain relative URI into a path.
fn uri_to_path(uri: &str) -> Utf8PathBuf {
    let path = uri.strip_prefix("file://").unwrap_or(uri);

    // `file:///C:/src/...` keeps a leading slash in front of the drive letter
    let path = match path.strip_prefix('/') {
        Some(rest) if rest.as_bytes().get(1) == Some(&b':') => rest,
        _ => path,
    };

    Utf8PathBuf::from(path.replace("%20", " "))
}

fn symbol_element(kind: CodeElementKind, fqn: String, metrics: BTreeMap<MetricIdentifier, u32>) -> ParsedCodeElement {
    let (name, parent) = match kind {
        CodeElementKind::Member => {
            let parent = parent_path(&fqn).unwrap_or_else(|| GLOBAL_NAMESPACE.to_string());
            (extract_method_name(&fqn), Some(parent))
        }
        CodeElementKind::Type => {
            let parent = parent_path(&fqn).unwrap_or_else(|| GLOBAL_NAMESPACE.to_string());
            (simple_type_name(&fqn), Some(parent))
        }
        CodeElementKind::Namespace | CodeElementKind::Assembly => (fqn.clone(), None),
    };

    let mut element = ParsedCodeElement::new(kind, name, fqn, parent, UNKNOWN_ASSEMBLY);
    if kind == CodeElementKind::Member {
        element = element.with_member_kind(MemberKind::Method);
    }

    for (metric, count) in metrics {
        element = element.with_metric(metric, f64::from(count));
    }

    element
}

/// Everything before the final dotted segment, ignoring dots inside the parameter list.
fn parent_path(fqn: &str) -> Option<String> {
    let head = fqn.split('(').next().unwrap_or(fqn);
    let (parent, _) = head.trim_end_matches('.').rsplit_once('.')?;
    let parent = parent.trim_end_matches('.');
    (!parent.is_empty()).then(|| parent.to_string())
}
