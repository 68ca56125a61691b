//! Cross-document identity checks.
//!
//! Two documents of the same family describing the same type or member would
//! make the merge ambiguous, so every such symbol is reported before the tree
//! is built.

use crate::model::{CodeElementKind, ParsedMetricsDocument, ParserFamily};
use std::collections::{BTreeSet, HashMap, HashSet};

const LOG_TARGET: &str = " validator";

/// A type or member reported by two different documents of the same family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCollision {
    pub family: ParserFamily,
    pub fully_qualified_name: String,
    pub first_document: String,
    pub second_document: String,
}

/// Find every type or member FQN that more than one document of the same family reports.
///
/// A symbol repeated within a single document is not a collision, and blank
/// FQNs are ignored. Each colliding FQN is reported once, naming the first
/// two documents that contain it.
#[must_use]
pub fn find_symbol_collisions(documents: &[ParsedMetricsDocument]) -> Vec<SymbolCollision> {
    let mut owners: HashMap<(ParserFamily, &str), usize> = HashMap::new();
    let mut reported: HashSet<(ParserFamily, &str)> = HashSet::new();
    let mut collisions = Vec::new();

    for (ordinal, document) in documents.iter().enumerate() {
        let symbols: BTreeSet<&str> = document
            .elements
            .iter()
            .filter(|element| matches!(element.kind, CodeElementKind::Type | CodeElementKind::Member))
            .map(|element| element.fully_qualified_name.as_str())
            .filter(|fqn| !fqn.trim().is_empty())
            .collect();

        for fqn in symbols {
            let key = (document.family, fqn);
            match owners.get(&key) {
                None => {
                    let _ = owners.insert(key, ordinal);
                }
                Some(&owner) => {
                    if reported.insert(key) {
                        collisions.push(SymbolCollision {
                            family: document.family,
                            fully_qualified_name: fqn.to_string(),
                            first_document: documents[owner].display_id(owner),
                            second_document: document.display_id(ordinal),
                        });
                    }
                }
            }
        }
    }

    collisions
}

/// Check that no symbol is reported by two documents of the same family.
///
/// Logs one error per colliding symbol and returns `false` if any were found.
#[must_use]
pub fn try_validate_unique_symbols(documents: &[ParsedMetricsDocument]) -> bool {
    let collisions = find_symbol_collisions(documents);

    for collision in &collisions {
        log::error!(
            target: LOG_TARGET,
            "{} symbol '{}' is reported by both '{}' and '{}'",
            collision.family,
            collision.fully_qualified_name,
            collision.first_document,
            collision.second_document
        );
    }

    collisions.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberKind, ParsedCodeElement};

    fn member(fqn: &str) -> ParsedCodeElement {
        ParsedCodeElement::new(CodeElementKind::Member, "MethodA", fqn, Some("NS.TypeA".into()), "Asm")
            .with_member_kind(MemberKind::Method)
    }

    fn document(path: Option<&str>, family: ParserFamily, fqns: &[&str]) -> ParsedMetricsDocument {
        let mut document = ParsedMetricsDocument::new(path.map(Into::into), family);
        document.elements = fqns.iter().map(|fqn| member(fqn)).collect();
        document
    }

    #[test]
    fn test_cross_document_duplicate_is_one_collision() {
        let documents = vec![
            document(Some("a.xml"), ParserFamily::Coverage, &["NS.TypeA.MethodA(...)"]),
            document(Some("b.xml"), ParserFamily::Coverage, &["NS.TypeA.MethodA(...)"]),
        ];

        let collisions = find_symbol_collisions(&documents);
        assert_eq!(
            collisions,
            vec![SymbolCollision {
                family: ParserFamily::Coverage,
                fully_qualified_name: "NS.TypeA.MethodA(...)".to_string(),
                first_document: "a.xml".to_string(),
                second_document: "b.xml".to_string(),
            }]
        );
        assert!(!try_validate_unique_symbols(&documents));
    }

    #[test]
    fn test_repeat_within_document_is_tolerated() {
        let documents = vec![document(
            Some("a.xml"),
            ParserFamily::Coverage,
            &["NS.TypeA.MethodA(...)", "NS.TypeA.MethodA(...)"],
        )];

        assert!(find_symbol_collisions(&documents).is_empty());
        assert!(try_validate_unique_symbols(&documents));
    }

    #[test]
    fn test_different_families_do_not_collide() {
        let documents = vec![
            document(Some("a.xml"), ParserFamily::Coverage, &["NS.TypeA.MethodA(...)"]),
            document(Some("b.xml"), ParserFamily::Structure, &["NS.TypeA.MethodA(...)"]),
        ];

        assert!(try_validate_unique_symbols(&documents));
    }

    #[test]
    fn test_three_documents_report_once() {
        let documents = vec![
            document(Some("a.xml"), ParserFamily::Coverage, &["NS.TypeA.MethodA(...)"]),
            document(Some("b.xml"), ParserFamily::Coverage, &["NS.TypeA.MethodA(...)"]),
            document(Some("c.xml"), ParserFamily::Coverage, &["NS.TypeA.MethodA(...)"]),
        ];

        assert_eq!(find_symbol_collisions(&documents).len(), 1);
    }

    #[test]
    fn test_blank_fqns_ignored() {
        let documents = vec![
            document(Some("a.xml"), ParserFamily::Coverage, &["  "]),
            document(Some("b.xml"), ParserFamily::Coverage, &["  "]),
        ];

        assert!(try_validate_unique_symbols(&documents));
    }

    #[test]
    fn test_pathless_documents_use_ordinal() {
        let documents = vec![
            document(None, ParserFamily::Findings, &["NS.TypeA.MethodA(...)"]),
            document(None, ParserFamily::Findings, &["NS.TypeA.MethodA(...)"]),
        ];

        let collisions = find_symbol_collisions(&documents);
        assert_eq!(collisions[0].first_document, "<document #0>");
        assert_eq!(collisions[0].second_document, "<document #1>");
    }

    #[test]
    fn test_namespaces_and_assemblies_are_not_checked() {
        let mut first = ParsedMetricsDocument::new(Some("a.xml".into()), ParserFamily::Structure);
        first.elements.push(ParsedCodeElement::new(CodeElementKind::Namespace, "NS", "NS", Some("Asm".into()), "Asm"));
        let mut second = ParsedMetricsDocument::new(Some("b.xml".into()), ParserFamily::Structure);
        second.elements.push(ParsedCodeElement::new(CodeElementKind::Namespace, "NS", "NS", Some("Asm".into()), "Asm"));

        assert!(try_validate_unique_symbols(&[first, second]));
    }
}
