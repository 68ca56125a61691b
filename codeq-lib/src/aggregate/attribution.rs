//! Placement of findings that only carry a source position.
//!
//! A finding goes to the member of the same file whose declaration starts
//! closest above the finding line, i.e. the greatest start line that is not
//! after it. Equal start lines (partial declarations, generated members) are
//! broken by the smallest FQN. A finding above every member of its file goes
//! to the type declaring the first member of that file. Findings in files no
//! member maps to are dropped, and so are findings whose path matches members
//! of more than one file (a bare `Program.cs` in a multi-project solution).

use super::node::NodeId;
use super::tree::AggregationTree;
use crate::model::{CodeElementKind, SourceLocation, UnattributedFinding, file_key};
use std::collections::HashMap;

const LOG_TARGET: &str = "attribution";

struct Candidate<'a> {
    id: NodeId,
    source: &'a SourceLocation,
    fqn: &'a str,
}

/// Members with a source location, grouped by lowercased file name.
struct MemberIndex<'a> {
    by_file: HashMap<String, Vec<Candidate<'a>>>,
}

impl<'a> MemberIndex<'a> {
    fn new(tree: &'a AggregationTree) -> Self {
        let mut by_file: HashMap<String, Vec<Candidate<'a>>> = HashMap::new();

        for id in tree.node_ids() {
            let node = tree.node(id);
            if node.kind != CodeElementKind::Member {
                continue;
            }

            let Some(source) = node.source.as_ref() else {
                continue;
            };

            if let Some(key) = source.file_key() {
                by_file.entry(key).or_default().push(Candidate {
                    id,
                    source,
                    fqn: &node.fully_qualified_name,
                });
            }
        }

        Self { by_file }
    }

    fn candidates(&self, finding: &UnattributedFinding) -> Vec<&Candidate<'a>> {
        file_key(finding.path.as_str())
            .and_then(|key| self.by_file.get(&key))
            .map(|bucket| bucket.iter().filter(|candidate| candidate.source.same_file(&finding.path)).collect())
            .unwrap_or_default()
    }
}

enum Placement {
    Node(NodeId),
    NoCandidate,
    Ambiguous,
}

pub(super) fn attribute_findings<'a>(tree: &mut AggregationTree, findings: impl IntoIterator<Item = &'a UnattributedFinding>) {
    let mut placements = Vec::new();

    {
        let index = MemberIndex::new(tree);
        for finding in findings {
            match locate(tree, &index, finding) {
                Placement::Node(id) => {
                    log::trace!(
                        target: LOG_TARGET,
                        "Attributed {} at {}:{} to '{}'",
                        finding.rule_id,
                        finding.path,
                        finding.line,
                        tree.node(id).fully_qualified_name
                    );
                    placements.push((id, finding.metric));
                }
                Placement::NoCandidate => {
                    log::debug!(
                        target: LOG_TARGET,
                        "Dropping {} at {}:{}, no symbol is declared in that file",
                        finding.rule_id,
                        finding.path,
                        finding.line
                    );
                }
                Placement::Ambiguous => {
                    log::debug!(
                        target: LOG_TARGET,
                        "Dropping {} at {}:{}, the path matches more than one source file",
                        finding.rule_id,
                        finding.path,
                        finding.line
                    );
                }
            }
        }
    }

    for (id, metric) in placements {
        tree.count_violation(id, metric);
    }
}

fn locate(tree: &AggregationTree, index: &MemberIndex<'_>, finding: &UnattributedFinding) -> Placement {
    let candidates = index.candidates(finding);
    let Some(first) = candidates.first() else {
        return Placement::NoCandidate;
    };

    if candidates.iter().any(|candidate| !candidate.source.same_file(&first.source.path)) {
        return Placement::Ambiguous;
    }

    let enclosing = candidates
        .iter()
        .filter(|candidate| candidate.source.start_line <= finding.line)
        .max_by(|a, b| a.source.start_line.cmp(&b.source.start_line).then_with(|| b.fqn.cmp(a.fqn)));

    if let Some(member) = enclosing {
        return Placement::Node(member.id);
    }

    candidates
        .iter()
        .min_by(|a, b| a.source.start_line.cmp(&b.source.start_line).then_with(|| a.fqn.cmp(b.fqn)))
        .and_then(|earliest| tree.node(earliest.id).parent)
        .map_or(Placement::NoCandidate, Placement::Node)
}

#[cfg(test)]
mod tests {
    use crate::aggregate::build_tree;
    use crate::model::{
        CodeElementKind, MemberKind, MetricIdentifier, ParsedCodeElement, ParsedMetricsDocument, ParserFamily, SourceLocation,
        UnattributedFinding,
    };

    fn member(fqn: &str, path: &str, line: u32) -> ParsedCodeElement {
        ParsedCodeElement::new(CodeElementKind::Member, "M", fqn, Some("NS.Widget".into()), "Asm")
            .with_member_kind(MemberKind::Method)
            .with_source(Some(SourceLocation::new(path, line)))
    }

    fn finding(path: &str, line: u32) -> UnattributedFinding {
        UnattributedFinding {
            path: path.into(),
            line,
            rule_id: "CA2000".into(),
            metric: MetricIdentifier::SarifCaRuleViolations,
        }
    }

    fn documents(findings: Vec<UnattributedFinding>) -> Vec<ParsedMetricsDocument> {
        let mut structure = ParsedMetricsDocument::new(Some("metrics.xml".into()), ParserFamily::Structure);
        structure.elements = vec![
            member("NS.Widget.Run(...)", "C:\\src\\Widget.cs", 10),
            member("NS.Widget.Stop(...)", "C:\\src\\Widget.cs", 30),
            member("NS.Widget.Alpha(...)", "C:\\src\\Widget.cs", 30),
        ];

        let mut sarif = ParsedMetricsDocument::new(Some("build.sarif".into()), ParserFamily::Findings);
        sarif.unattributed_findings = findings;
        vec![structure, sarif]
    }

    fn count(tree: &crate::aggregate::AggregationTree, kind: CodeElementKind, fqn: &str) -> Option<f64> {
        let id = tree.find(kind, fqn).unwrap();
        tree.node(id).metrics.get(&MetricIdentifier::SarifCaRuleViolations).copied()
    }

    #[test]
    fn test_greatest_start_line_not_after_finding() {
        let tree = build_tree(&documents(vec![finding("src/Widget.cs", 20)]), "S");
        assert_eq!(count(&tree, CodeElementKind::Member, "NS.Widget.Run(...)"), Some(1.0));
        assert_eq!(count(&tree, CodeElementKind::Member, "NS.Widget.Stop(...)"), None);
    }

    #[test]
    fn test_tie_goes_to_smallest_fqn() {
        let tree = build_tree(&documents(vec![finding("src/Widget.cs", 35), finding("src/Widget.cs", 30)]), "S");
        assert_eq!(count(&tree, CodeElementKind::Member, "NS.Widget.Alpha(...)"), Some(2.0));
        assert_eq!(count(&tree, CodeElementKind::Member, "NS.Widget.Stop(...)"), None);
    }

    #[test]
    fn test_finding_above_first_member_goes_to_type() {
        let tree = build_tree(&documents(vec![finding("src/Widget.cs", 3)]), "S");
        assert_eq!(count(&tree, CodeElementKind::Member, "NS.Widget.Run(...)"), None);
        assert_eq!(count(&tree, CodeElementKind::Type, "NS.Widget"), Some(1.0));
    }

    #[test]
    fn test_same_file_name_in_two_projects() {
        let mut structure = ParsedMetricsDocument::new(Some("metrics.xml".into()), ParserFamily::Structure);
        structure.elements = vec![
            ParsedCodeElement::new(CodeElementKind::Member, "Main", "Billing.Program.Main(...)", Some("Billing.Program".into()), "Billing")
                .with_member_kind(MemberKind::Method)
                .with_source(Some(SourceLocation::new("C:\\src\\Billing\\Program.cs", 5))),
            ParsedCodeElement::new(CodeElementKind::Member, "Main", "Shipping.Program.Main(...)", Some("Shipping.Program".into()), "Shipping")
                .with_member_kind(MemberKind::Method)
                .with_source(Some(SourceLocation::new("C:\\src\\Shipping\\Program.cs", 5))),
        ];
        let mut sarif = ParsedMetricsDocument::new(Some("build.sarif".into()), ParserFamily::Findings);
        sarif.unattributed_findings = vec![
            finding("Program.cs", 9),
            finding("C:/src/Shipping/Program.cs", 9),
            finding("Shipping/Program.cs", 9),
            finding("D:/elsewhere/Billing/Program.cs", 9),
        ];

        let tree = build_tree(&[structure, sarif], "S");
        assert_eq!(count(&tree, CodeElementKind::Member, "Shipping.Program.Main(...)"), Some(2.0));
        assert_eq!(count(&tree, CodeElementKind::Member, "Billing.Program.Main(...)"), None);
    }

    #[test]
    fn test_finding_in_unknown_file_is_dropped() {
        let tree = build_tree(&documents(vec![finding("src/Other.cs", 12)]), "S");
        assert_eq!(count(&tree, CodeElementKind::Type, "NS.Widget"), None);
        assert_eq!(count(&tree, CodeElementKind::Assembly, "Asm"), None);
    }
}
