//! Reader for Roslyn code metrics reports.
//!
//! The report is an explicit `Target → Assembly → Namespace → NamedType →
//! member` tree. Each level carries a `Metrics` block of named values, and
//! members optionally carry a `File`/`Line` source reference.

use super::MetricsParser;
use super::xml::{attr_f64, attr_u32, child, children};
use crate::Result;
use crate::model::{
    CodeElementKind, MemberKind, MetricIdentifier, ParsedCodeElement, ParsedMetricsDocument, ParserFamily, SourceLocation,
};
use crate::symbols::{
    GLOBAL_NAMESPACE, UNKNOWN_ASSEMBLY, UNKNOWN_MEMBER, UNKNOWN_TYPE, combine_member_fqn, extract_method_name,
    normalize_type_name,
};
use camino::Utf8Path;
use ohno::IntoAppError;
use roxmltree::{Document, Node};
use std::collections::HashSet;

const LOG_TARGET: &str = " structure";

/// Metric names reported by the tool and the identifiers they map to.
const METRIC_NAMES: &[(&str, MetricIdentifier)] = &[
    ("MaintainabilityIndex", MetricIdentifier::RoslynMaintainabilityIndex),
    ("CyclomaticComplexity", MetricIdentifier::RoslynCyclomaticComplexity),
    ("ClassCoupling", MetricIdentifier::RoslynClassCoupling),
    ("DepthOfInheritance", MetricIdentifier::RoslynDepthOfInheritance),
    ("SourceLines", MetricIdentifier::RoslynSourceLines),
    ("LinesOfCode", MetricIdentifier::RoslynSourceLines),
    ("ExecutableLines", MetricIdentifier::RoslynExecutableLines),
];

const ACCESSOR_KEYWORDS: &[&str] = &["get", "set", "init", "add", "remove"];

/// Parser for Roslyn `CodeMetricsReport` XML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureParser;

impl MetricsParser for StructureParser {
    const FAMILY: ParserFamily = ParserFamily::Structure;

    fn parse_content(&self, content: &str, source_path: Option<&Utf8Path>) -> Result<ParsedMetricsDocument> {
        let display = source_path.map_or("<inline>", Utf8Path::as_str);
        let xml = Document::parse(content).into_app_err_with(|| format!("malformed code metrics document '{display}'"))?;

        let root = xml.root_element();
        if !root.has_tag_name("CodeMetricsReport") {
            return Err(ohno::app_err!(
                "malformed code metrics document '{display}': expected a CodeMetricsReport root element, found '{}'",
                root.tag_name().name()
            ));
        }

        let mut document = ParsedMetricsDocument::new(source_path.map(Utf8Path::to_path_buf), Self::FAMILY);

        for target in child(root, "Targets")
            .into_iter()
            .flat_map(|targets| children(targets, "Target"))
        {
            if let Some(name) = target.attribute("Name").map(str::trim).filter(|name| !name.is_empty()) {
                document.solution_name = Some(name.to_string());
            }

            for assembly in children(target, "Assembly") {
                parse_assembly(assembly, &mut document.elements);
            }
        }

        log::debug!(target: LOG_TARGET, "Parsed {} elements from code metrics document '{display}'", document.elements.len());
        Ok(document)
    }
}

fn parse_assembly(assembly: Node<'_, '_>, elements: &mut Vec<ParsedCodeElement>) {
    let name = assembly
        .attribute("Name")
        .map_or(UNKNOWN_ASSEMBLY, |display| display.split(',').next().unwrap_or_default().trim())
        .to_string();

    elements.push(with_metrics(
        ParsedCodeElement::new(CodeElementKind::Assembly, &name, &name, None, &name),
        assembly,
    ));

    for namespace in child(assembly, "Namespaces")
        .into_iter()
        .flat_map(|namespaces| children(namespaces, "Namespace"))
    {
        parse_namespace(namespace, &name, elements);
    }
}

fn parse_namespace(namespace: Node<'_, '_>, assembly: &str, elements: &mut Vec<ParsedCodeElement>) {
    // A missing name is the global namespace, an explicitly empty one is kept as-is
    let name = namespace.attribute("Name").map_or(GLOBAL_NAMESPACE, str::trim).to_string();

    elements.push(with_metrics(
        ParsedCodeElement::new(CodeElementKind::Namespace, &name, &name, Some(assembly.to_string()), assembly),
        namespace,
    ));

    for named_type in child(namespace, "Types")
        .into_iter()
        .flat_map(|types| children(types, "NamedType"))
    {
        parse_type(named_type, &name, assembly, elements);
    }
}

fn parse_type(named_type: Node<'_, '_>, namespace: &str, assembly: &str, elements: &mut Vec<ParsedCodeElement>) {
    let type_name = named_type
        .attribute("Name")
        .map_or_else(|| UNKNOWN_TYPE.to_string(), nested_type_name);

    let type_fqn = if namespace.is_empty() || namespace == GLOBAL_NAMESPACE {
        type_name.clone()
    } else {
        format!("{namespace}.{type_name}")
    };

    elements.push(with_metrics(
        ParsedCodeElement::new(CodeElementKind::Type, &type_name, &type_fqn, Some(namespace.to_string()), assembly),
        named_type,
    ));

    let Some(members) = child(named_type, "Members") else {
        return;
    };

    // Properties and events are modeled directly, so their accessor methods would count twice
    let modeled: HashSet<String> = members
        .children()
        .filter(|node| node.has_tag_name("Property") || node.has_tag_name("Event"))
        .filter_map(|node| node.attribute("Name"))
        .map(extract_method_name)
        .collect();

    for member in members.children().filter(Node::is_element) {
        let member_kind = match member.tag_name().name() {
            "Method" => MemberKind::Method,
            "Property" => MemberKind::Property,
            "Field" => MemberKind::Field,
            "Event" => MemberKind::Event,
            other => {
                log::debug!(target: LOG_TARGET, "Ignoring unknown member element '{other}' in type '{type_fqn}'");
                continue;
            }
        };

        let display = member.attribute("Name").unwrap_or(UNKNOWN_MEMBER);
        if member_kind == MemberKind::Method && is_accessor(display, &modeled) {
            log::trace!(target: LOG_TARGET, "Skipping accessor '{display}' in type '{type_fqn}'");
            continue;
        }

        let source = member.attribute("File").and_then(|file| {
            let line = attr_u32(member, "Line")?;
            Some(SourceLocation::new(file, line))
        });

        let element = ParsedCodeElement::new(
            CodeElementKind::Member,
            extract_method_name(display),
            combine_member_fqn(&type_fqn, display),
            Some(type_fqn.clone()),
            assembly,
        )
        .with_member_kind(member_kind)
        .with_source(source);

        elements.push(with_metrics(element, member));
    }
}

/// Convert a dotted nested type name (`Outer<T>.Inner`) to canonical form (`Outer+Inner`).
fn nested_type_name(raw: &str) -> String {
    crate::symbols::normalize_qualified_type_name(raw)
        .split('.')
        .map(normalize_type_name)
        .collect::<Vec<_>>()
        .join("+")
}

/// Whether a method is the getter, setter, adder, or remover of a modeled property or event.
fn is_accessor(display: &str, modeled: &HashSet<String>) -> bool {
    let head = display.split('(').next().unwrap_or_default().trim();
    let Some(last_word) = head.split_whitespace().last() else {
        return false;
    };

    let segments: Vec<&str> = last_word.split('.').collect();
    if let [.., owner, keyword] = segments.as_slice()
        && ACCESSOR_KEYWORDS.contains(keyword)
        && modeled.contains(*owner)
    {
        return true;
    }

    let method_name = segments.last().copied().unwrap_or_default();
    ACCESSOR_KEYWORDS.iter().any(|keyword| {
        method_name
            .strip_prefix(keyword)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|property| modeled.contains(property))
    })
}

fn with_metrics(mut element: ParsedCodeElement, node: Node<'_, '_>) -> ParsedCodeElement {
    for metric in child(node, "Metrics")
        .into_iter()
        .flat_map(|metrics| children(metrics, "Metric"))
    {
        let Some(id) = metric
            .attribute("Name")
            .and_then(|name| METRIC_NAMES.iter().find(|(known, _)| *known == name))
            .map(|(_, id)| *id)
        else {
            continue;
        };

        if let Some(value) = attr_f64(metric, "Value") {
            let _ = element.metrics.insert(id, value);
        }
    }

    element
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CodeMetricsReport Version="1.0">
  <Targets>
    <Target Name="Contoso.Core.csproj">
      <Assembly Name="Contoso.Core, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null">
        <Metrics>
          <Metric Name="MaintainabilityIndex" Value="82" />
          <Metric Name="CyclomaticComplexity" Value="14" />
        </Metrics>
        <Namespaces>
          <Namespace Name="Contoso.Core">
            <Metrics>
              <Metric Name="MaintainabilityIndex" Value="82" />
            </Metrics>
            <Types>
              <NamedType Name="Widget">
                <Metrics>
                  <Metric Name="MaintainabilityIndex" Value="78" />
                  <Metric Name="ClassCoupling" Value="12" />
                  <Metric Name="DepthOfInheritance" Value="1" />
                  <Metric Name="SourceLines" Value="120" />
                  <Metric Name="FutureMetric" Value="7" />
                  <Metric Name="CyclomaticComplexity" Value="n/a" />
                </Metrics>
                <Members>
                  <Method Name="void Widget.Run(object? sender, EventArgs e)" File="C:\src\Contoso.Core\Widget.cs" Line="12">
                    <Metrics>
                      <Metric Name="CyclomaticComplexity" Value="3" />
                      <Metric Name="ExecutableLines" Value="9" />
                    </Metrics>
                  </Method>
                  <Method Name="Widget.Widget(int size)" File="C:\src\Contoso.Core\Widget.cs" Line="not-a-line" />
                  <Property Name="int Widget.Count" File="C:\src\Contoso.Core\Widget.cs" Line="30">
                    <Metrics>
                      <Metric Name="CyclomaticComplexity" Value="2" />
                    </Metrics>
                    <Accessors>
                      <Method Name="int Widget.Count.get" />
                    </Accessors>
                  </Property>
                  <Method Name="int Widget.Count.get" />
                  <Method Name="void Widget.set_Count(int value)" />
                  <Field Name="int Widget._size" />
                  <Event Name="EventHandler Widget.Changed" />
                </Members>
              </NamedType>
              <NamedType Name="Widget.Builder">
                <Members>
                  <Method Name="Widget Widget.Builder.Build()" />
                </Members>
              </NamedType>
              <NamedType>
                <Members>
                  <Method />
                </Members>
              </NamedType>
            </Types>
          </Namespace>
          <Namespace>
            <Types>
              <NamedType Name="Program" />
            </Types>
          </Namespace>
          <Namespace Name="" />
        </Namespaces>
      </Assembly>
    </Target>
    <Target>
      <Assembly />
    </Target>
  </Targets>
</CodeMetricsReport>"#;

    fn parse(content: &str) -> ParsedMetricsDocument {
        StructureParser.parse_content(content, Some(Utf8Path::new("metrics.xml"))).unwrap()
    }

    fn find<'a>(document: &'a ParsedMetricsDocument, kind: CodeElementKind, fqn: &str) -> &'a ParsedCodeElement {
        document
            .elements
            .iter()
            .find(|e| e.kind == kind && e.fully_qualified_name == fqn)
            .unwrap_or_else(|| panic!("missing {kind} '{fqn}'"))
    }

    #[test]
    fn test_assembly_name_cut_at_comma() {
        let document = parse(REPORT);
        let assembly = find(&document, CodeElementKind::Assembly, "Contoso.Core");
        assert_eq!(assembly.metrics.get(&MetricIdentifier::RoslynMaintainabilityIndex), Some(&82.0));
    }

    #[test]
    fn test_member_fqn_matches_coverage_dialect() {
        let document = parse(REPORT);
        let run = find(&document, CodeElementKind::Member, "Contoso.Core.Widget.Run(...)");
        assert_eq!(run.name, "Run");
        assert_eq!(run.member_kind, Some(MemberKind::Method));
        assert_eq!(run.metrics.get(&MetricIdentifier::RoslynCyclomaticComplexity), Some(&3.0));

        let source = run.source.as_ref().unwrap();
        assert_eq!(source.start_line, 12);
    }

    #[test]
    fn test_constructor_and_unparsable_line() {
        let document = parse(REPORT);
        let ctor = find(&document, CodeElementKind::Member, "Contoso.Core.Widget..ctor(...)");
        assert!(ctor.source.is_none());
    }

    #[test]
    fn test_unknown_metrics_and_values_dropped() {
        let document = parse(REPORT);
        let widget = find(&document, CodeElementKind::Type, "Contoso.Core.Widget");
        assert_eq!(widget.metrics.len(), 4);
        assert_eq!(widget.metrics.get(&MetricIdentifier::RoslynClassCoupling), Some(&12.0));
        assert!(!widget.metrics.contains_key(&MetricIdentifier::RoslynCyclomaticComplexity));
    }

    #[test]
    fn test_accessors_skipped() {
        let document = parse(REPORT);
        let members: Vec<_> = document
            .elements
            .iter()
            .filter(|e| e.parent_fully_qualified_name.as_deref() == Some("Contoso.Core.Widget"))
            .map(|e| e.fully_qualified_name.as_str())
            .collect();

        assert_eq!(
            members,
            vec![
                "Contoso.Core.Widget.Run(...)",
                "Contoso.Core.Widget..ctor(...)",
                "Contoso.Core.Widget.Count",
                "Contoso.Core.Widget._size",
                "Contoso.Core.Widget.Changed",
            ]
        );

        let count = find(&document, CodeElementKind::Member, "Contoso.Core.Widget.Count");
        assert_eq!(count.member_kind, Some(MemberKind::Property));
    }

    #[test]
    fn test_nested_type_uses_plus() {
        let document = parse(REPORT);
        let builder = find(&document, CodeElementKind::Type, "Contoso.Core.Widget+Builder");
        assert_eq!(builder.parent_fully_qualified_name.as_deref(), Some("Contoso.Core"));
        let _ = find(&document, CodeElementKind::Member, "Contoso.Core.Widget+Builder.Build(...)");
    }

    #[test]
    fn test_missing_names_use_sentinels() {
        let document = parse(REPORT);
        let _ = find(&document, CodeElementKind::Type, "Contoso.Core.<UnknownType>");
        let _ = find(&document, CodeElementKind::Member, "Contoso.Core.<UnknownType>.<UnknownMember>");
        let _ = find(&document, CodeElementKind::Assembly, UNKNOWN_ASSEMBLY);
    }

    #[test]
    fn test_global_and_empty_namespaces_are_distinct() {
        let document = parse(REPORT);
        let _ = find(&document, CodeElementKind::Namespace, GLOBAL_NAMESPACE);
        let _ = find(&document, CodeElementKind::Namespace, "");

        let program = find(&document, CodeElementKind::Type, "Program");
        assert_eq!(program.parent_fully_qualified_name.as_deref(), Some(GLOBAL_NAMESPACE));
    }

    #[test]
    fn test_unnamed_target_keeps_solution_name() {
        let document = parse(REPORT);
        assert_eq!(document.solution_name.as_deref(), Some("Contoso.Core.csproj"));
    }

    #[test]
    fn test_last_named_target_wins() {
        let content = r#"<CodeMetricsReport><Targets>
            <Target Name="First.csproj" />
            <Target Name="Second.csproj" />
            <Target Name="" />
        </Targets></CodeMetricsReport>"#;
        assert_eq!(parse(content).solution_name.as_deref(), Some("Second.csproj"));
    }

    #[test]
    fn test_malformed_document_names_path() {
        let err = StructureParser
            .parse_content("<CodeMetricsReport><Targets>", Some(Utf8Path::new("bad-metrics.xml")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("bad-metrics.xml"));
    }

    #[test]
    fn test_nested_type_name() {
        assert_eq!(nested_type_name("Outer<T>.Inner"), "Outer+Inner");
        assert_eq!(nested_type_name("Repository<TKey, TValue>"), "Repository");
    }
}
