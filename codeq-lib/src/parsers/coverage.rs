//! Reader for OpenCover coverage sessions.
//!
//! OpenCover does not model namespaces or a type hierarchy. Every class and
//! method carries a full name in CLR notation (`NS.Outer/Inner`,
//! `System.Void NS.Type::Run(System.Int32)`), from which the
//! Namespace → Type → Member structure is derived.
//!
//! Property and event accessors (`get_Count`, `set_Count`, `add_Changed`) are
//! folded into one member named after the property or event, which is how
//! code metrics reports name them. Their point counts are summed.

use super::MetricsParser;
use super::xml::{attr_f64, attr_u32, attr_u64, child, child_text, children};
use crate::Result;
use crate::model::{
    CodeElementKind, MemberKind, MetricIdentifier, ParsedCodeElement, ParsedMetricsDocument, ParserFamily, SourceLocation,
};
use crate::symbols::{
    GLOBAL_NAMESPACE, UNKNOWN_ASSEMBLY, combine_member_fqn, extract_method_name, normalize_qualified_type_name,
};
use camino::{Utf8Path, Utf8PathBuf};
use ohno::IntoAppError;
use regex::Regex;
use roxmltree::{Document, Node};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

const LOG_TARGET: &str = "  coverage";

/// Rewrites applied, in order, to every OpenCover name before normalization.
static DIALECT_RULES: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    [
        (Regex::new("::").expect("invalid regex"), "."),
        (Regex::new("/").expect("invalid regex"), "+"),
        (Regex::new(r"`+\d+").expect("invalid regex"), ""),
    ]
});

/// Accessor method prefixes and the kind of member they belong to.
const ACCESSOR_PREFIXES: [(&str, MemberKind); 5] = [
    ("get_", MemberKind::Property),
    ("set_", MemberKind::Property),
    ("init_", MemberKind::Property),
    ("add_", MemberKind::Event),
    ("remove_", MemberKind::Event),
];

fn apply_dialect_rules(raw: &str) -> String {
    DIALECT_RULES
        .iter()
        .fold(raw.trim().to_string(), |name, (pattern, replacement)| {
            pattern.replace_all(&name, *replacement).into_owned()
        })
}

/// Parser for OpenCover XML (`CoverageSession`) documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoverageParser;

impl MetricsParser for CoverageParser {
    const FAMILY: ParserFamily = ParserFamily::Coverage;

    fn parse_content(&self, content: &str, source_path: Option<&Utf8Path>) -> Result<ParsedMetricsDocument> {
        let display = source_path.map_or("<inline>", Utf8Path::as_str);
        let xml = Document::parse(content).into_app_err_with(|| format!("malformed coverage document '{display}'"))?;

        let root = xml.root_element();
        if !root.has_tag_name("CoverageSession") {
            return Err(ohno::app_err!(
                "malformed coverage document '{display}': expected a CoverageSession root element, found '{}'",
                root.tag_name().name()
            ));
        }

        let mut document = ParsedMetricsDocument::new(source_path.map(Utf8Path::to_path_buf), Self::FAMILY);

        let Some(modules) = child(root, "Modules") else {
            log::debug!(target: LOG_TARGET, "Coverage document '{display}' contains no modules");
            return Ok(document);
        };

        for module in children(modules, "Module") {
            if let Some(reason) = module.attribute("skippedDueTo") {
                log::debug!(
                    target: LOG_TARGET,
                    "Skipping module '{}' in '{display}': {reason}",
                    child_text(module, "ModuleName").unwrap_or_default()
                );
                continue;
            }

            parse_module(module, &mut document.elements);
        }

        log::debug!(target: LOG_TARGET, "Parsed {} elements from coverage document '{display}'", document.elements.len());
        Ok(document)
    }
}

fn parse_module(module: Node<'_, '_>, elements: &mut Vec<ParsedCodeElement>) {
    let assembly = child_text(module, "ModuleName")
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_ASSEMBLY)
        .to_string();

    let files: HashMap<&str, &str> = child(module, "Files")
        .into_iter()
        .flat_map(|files| children(files, "File"))
        .filter_map(|file| Some((file.attribute("uid")?, file.attribute("fullPath")?)))
        .collect();

    let mut assembly_element = ParsedCodeElement::new(CodeElementKind::Assembly, &assembly, &assembly, None, &assembly);
    if let Some(summary) = child(module, "Summary") {
        add_coverage_metrics(&mut assembly_element, PointCounts::from_summary(summary), summary);
    }
    elements.push(assembly_element);

    let mut namespaces: BTreeMap<String, PointCounts> = BTreeMap::new();

    for class in child(module, "Classes")
        .into_iter()
        .flat_map(|classes| children(classes, "Class"))
    {
        if class.attribute("skippedDueTo").is_some() {
            continue;
        }

        let Some(full_name) = child_text(class, "FullName") else {
            continue;
        };

        let type_fqn = normalize_qualified_type_name(&apply_dialect_rules(full_name));
        let (namespace, type_name) = split_type_fqn(&type_fqn);

        // Closures, iterators, and other compiler-generated classes have no source-level identity
        if type_name.split('+').any(|part| part.starts_with('<')) {
            continue;
        }

        let summary = child(class, "Summary");
        let counts = summary.map(PointCounts::from_summary).unwrap_or_default();
        namespaces.entry(namespace.clone()).or_default().add(counts);

        let mut type_element =
            ParsedCodeElement::new(CodeElementKind::Type, type_name, &type_fqn, Some(namespace), &assembly);
        if let Some(summary) = summary {
            add_coverage_metrics(&mut type_element, counts, summary);
        }
        elements.push(type_element);

        let mut accessors: BTreeMap<String, AccessorGroup> = BTreeMap::new();

        for method in child(class, "Methods")
            .into_iter()
            .flat_map(|methods| children(methods, "Method"))
        {
            if method.attribute("skippedDueTo").is_some() {
                continue;
            }

            let Some((element, counts)) = parse_method(method, &type_fqn, &assembly, &files) else {
                continue;
            };

            match accessor_owner(&element.name) {
                Some((owner, kind)) => {
                    let fqn = combine_member_fqn(&type_fqn, owner);
                    accessors
                        .entry(fqn)
                        .or_insert_with_key(|fqn| AccessorGroup::new(owner, fqn, kind, &type_fqn, &assembly))
                        .absorb(&element, counts);
                }
                None => elements.push(element),
            }
        }

        elements.extend(accessors.into_values().map(AccessorGroup::into_element));
    }

    for (namespace, counts) in namespaces {
        let mut element = ParsedCodeElement::new(
            CodeElementKind::Namespace,
            &namespace,
            &namespace,
            Some(assembly.clone()),
            &assembly,
        );

        if let Some(value) = counts.sequence_coverage() {
            element = element.with_metric(MetricIdentifier::OpenCoverSequenceCoverage, value);
        }
        if let Some(value) = counts.branch_coverage() {
            element = element.with_metric(MetricIdentifier::OpenCoverBranchCoverage, value);
        }

        elements.push(element);
    }
}

fn parse_method(
    method: Node<'_, '_>,
    type_fqn: &str,
    assembly: &str,
    files: &HashMap<&str, &str>,
) -> Option<(ParsedCodeElement, PointCounts)> {
    let raw_name = child_text(method, "Name")?;
    let name = apply_dialect_rules(raw_name);

    let fqn = combine_member_fqn(type_fqn, &name);
    let source = child(method, "FileRef")
        .and_then(|file_ref| file_ref.attribute("uid"))
        .and_then(|uid| files.get(uid))
        .and_then(|path| {
            let line = child(method, "SequencePoints")
                .and_then(|points| child(points, "SequencePoint"))
                .and_then(|point| attr_u32(point, "sl"))?;
            Some(SourceLocation::new(Utf8PathBuf::from(*path), line))
        });

    let mut element = ParsedCodeElement::new(
        CodeElementKind::Member,
        extract_method_name(&name),
        fqn,
        Some(type_fqn.to_string()),
        assembly,
    )
    .with_member_kind(MemberKind::Method)
    .with_source(source);

    let summary = child(method, "Summary");
    let counts = summary.map(PointCounts::from_summary).unwrap_or_default();
    if let Some(summary) = summary {
        add_coverage_metrics(&mut element, counts, summary);
    }

    if let Some(complexity) = attr_f64(method, "cyclomaticComplexity") {
        element = element.with_metric(MetricIdentifier::OpenCoverCyclomaticComplexity, complexity);
    }

    Some((element, counts))
}

/// The property or event an accessor method belongs to.
fn accessor_owner(method_name: &str) -> Option<(&str, MemberKind)> {
    ACCESSOR_PREFIXES.iter().find_map(|&(prefix, kind)| {
        method_name
            .strip_prefix(prefix)
            .filter(|owner| !owner.is_empty())
            .map(|owner| (owner, kind))
    })
}

/// The accessors of one property or event, merged into a single member.
struct AccessorGroup {
    element: ParsedCodeElement,
    counts: PointCounts,
    complexity: Option<f64>,
}

impl AccessorGroup {
    fn new(owner: &str, fqn: &str, kind: MemberKind, type_fqn: &str, assembly: &str) -> Self {
        Self {
            element: ParsedCodeElement::new(CodeElementKind::Member, owner, fqn, Some(type_fqn.to_string()), assembly)
                .with_member_kind(kind),
            counts: PointCounts::default(),
            complexity: None,
        }
    }

    fn absorb(&mut self, accessor: &ParsedCodeElement, counts: PointCounts) {
        self.counts.add(counts);

        if let Some(&complexity) = accessor.metrics.get(&MetricIdentifier::OpenCoverCyclomaticComplexity) {
            *self.complexity.get_or_insert(0.0) += complexity;
        }

        // The member starts at its first accessor
        let earlier = match (&self.element.source, &accessor.source) {
            (None, Some(_)) => true,
            (Some(current), Some(candidate)) => candidate.start_line < current.start_line,
            _ => false,
        };
        if earlier {
            self.element.source.clone_from(&accessor.source);
        }
    }

    fn into_element(self) -> ParsedCodeElement {
        let mut element = self.element;

        if let Some(value) = self.counts.sequence_coverage() {
            element = element.with_metric(MetricIdentifier::OpenCoverSequenceCoverage, value);
        }
        if let Some(value) = self.counts.branch_coverage() {
            element = element.with_metric(MetricIdentifier::OpenCoverBranchCoverage, value);
        }
        if let Some(complexity) = self.complexity {
            element = element.with_metric(MetricIdentifier::OpenCoverCyclomaticComplexity, complexity);
        }

        element
    }
}

/// Split a canonical type FQN into its namespace and its (possibly nested) type name.
fn split_type_fqn(type_fqn: &str) -> (String, &str) {
    match type_fqn.rsplit_once('.') {
        Some((namespace, type_name)) if !namespace.is_empty() => (namespace.to_string(), type_name),
        _ => (GLOBAL_NAMESPACE.to_string(), type_fqn),
    }
}

fn add_coverage_metrics(element: &mut ParsedCodeElement, counts: PointCounts, summary: Node<'_, '_>) {
    if let Some(value) = attr_f64(summary, "sequenceCoverage").or_else(|| counts.sequence_coverage()) {
        let _ = element.metrics.insert(MetricIdentifier::OpenCoverSequenceCoverage, value);
    }

    // Zero branch points means branch coverage does not apply, not that it is 0%
    if counts.branch_points > 0
        && let Some(value) = attr_f64(summary, "branchCoverage").or_else(|| counts.branch_coverage())
    {
        let _ = element.metrics.insert(MetricIdentifier::OpenCoverBranchCoverage, value);
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct PointCounts {
    sequence_points: u64,
    visited_sequence_points: u64,
    branch_points: u64,
    visited_branch_points: u64,
}

impl PointCounts {
    fn from_summary(summary: Node<'_, '_>) -> Self {
        Self {
            sequence_points: attr_u64(summary, "numSequencePoints").unwrap_or_default(),
            visited_sequence_points: attr_u64(summary, "visitedSequencePoints").unwrap_or_default(),
            branch_points: attr_u64(summary, "numBranchPoints").unwrap_or_default(),
            visited_branch_points: attr_u64(summary, "visitedBranchPoints").unwrap_or_default(),
        }
    }

    const fn add(&mut self, other: Self) {
        self.sequence_points += other.sequence_points;
        self.visited_sequence_points += other.visited_sequence_points;
        self.branch_points += other.branch_points;
        self.visited_branch_points += other.visited_branch_points;
    }

    fn sequence_coverage(self) -> Option<f64> {
        percentage(self.visited_sequence_points, self.sequence_points)
    }

    fn branch_coverage(self) -> Option<f64> {
        percentage(self.visited_branch_points, self.branch_points)
    }
}

#[expect(clippy::cast_precision_loss, reason = "point counts are far below 2^52")]
fn percentage(visited: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| {
        let raw = visited as f64 * 100.0 / total as f64;
        (raw * 100.0).round() / 100.0
    })
}
