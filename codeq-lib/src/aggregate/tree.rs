use super::attribution::attribute_findings;
use super::node::{NodeId, TreeNode};
use crate::model::{CodeElementKind, MetricIdentifier, ParsedCodeElement, ParsedMetricsDocument, ParserFamily};
use crate::symbols::{GLOBAL_NAMESPACE, UNKNOWN_ASSEMBLY, is_sentinel, simple_type_name};
use std::collections::{BTreeMap, HashMap};

const LOG_TARGET: &str = "      tree";

/// The merged Solution → Assembly → Namespace → Type → Member tree.
///
/// Nodes live in an arena and are looked up by `(kind, FQN)`, never by
/// reference, so the shape of the tree does not depend on the order in which
/// elements were merged.
#[derive(Debug, Clone, Default)]
pub struct AggregationTree {
    solution_name: String,
    nodes: Vec<TreeNode>,
    index: HashMap<(CodeElementKind, String), NodeId>,

    /// Types and members keyed by their FQN with nested types joined by `.`.
    dotted_index: HashMap<(CodeElementKind, String), NodeId>,
    assemblies: Vec<NodeId>,
}

impl AggregationTree {
    #[must_use]
    pub fn solution_name(&self) -> &str {
        &self.solution_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn find(&self, kind: CodeElementKind, fully_qualified_name: &str) -> Option<NodeId> {
        self.index.get(&(kind, fully_qualified_name.to_string())).copied()
    }

    /// Like [`find`](Self::find), but also accepts names that separate nested types with `.`.
    ///
    /// SARIF logical locations and documentation ids (`~T:NS.Outer.Inner`)
    /// cannot tell a nested type from a namespace segment. When no node has
    /// the exact name, the node whose name reads the same with every `+`
    /// replaced by `.` is returned.
    #[must_use]
    pub fn resolve(&self, kind: CodeElementKind, fully_qualified_name: &str) -> Option<NodeId> {
        self.find(kind, fully_qualified_name).or_else(|| {
            if kind == CodeElementKind::Type || kind == CodeElementKind::Member {
                self.dotted_index.get(&(kind, dotted(fully_qualified_name))).copied()
            } else {
                None
            }
        })
    }

    /// Assembly nodes, the children of the solution root.
    #[must_use]
    pub fn assemblies(&self) -> &[NodeId] {
        &self.assemblies
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Every node in depth-first order, parents before children.
    #[must_use]
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.assemblies.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }

        order
    }

    /// FQN of the node's parent, or the solution name for assemblies.
    #[must_use]
    pub fn parent_fully_qualified_name(&self, id: NodeId) -> &str {
        self.node(id)
            .parent
            .map_or(self.solution_name.as_str(), |parent| self.node(parent).fully_qualified_name.as_str())
    }

    fn get_or_create(&mut self, kind: CodeElementKind, name: &str, fqn: &str, assembly: &str, parent: Option<NodeId>) -> NodeId {
        if let Some(id) = self.find(kind, fqn) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        let mut node = TreeNode::new(kind, name.to_string(), fqn.to_string(), assembly.to_string());
        node.parent = parent;
        self.nodes.push(node);
        let _ = self.index.insert((kind, fqn.to_string()), id);
        if kind == CodeElementKind::Type || kind == CodeElementKind::Member {
            let _ = self.dotted_index.entry((kind, dotted(fqn))).or_insert(id);
        }

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.assemblies.push(id),
        }

        id
    }

    fn ensure_assembly(&mut self, assembly: &str) -> NodeId {
        self.get_or_create(CodeElementKind::Assembly, assembly, assembly, assembly, None)
    }

    fn ensure_namespace(&mut self, namespace: &str, assembly: &str) -> NodeId {
        if let Some(id) = self.find(CodeElementKind::Namespace, namespace) {
            return id;
        }

        let parent = self.ensure_assembly(assembly);
        self.get_or_create(CodeElementKind::Namespace, namespace, namespace, assembly, Some(parent))
    }

    fn ensure_type(&mut self, type_fqn: &str, namespace: Option<&str>, assembly: &str) -> NodeId {
        if let Some(id) = self.resolve(CodeElementKind::Type, type_fqn) {
            return id;
        }

        let namespace = namespace.map_or_else(|| namespace_of(type_fqn), ToString::to_string);
        let parent = self.ensure_namespace(&namespace, assembly);
        let name = simple_type_name(type_fqn);
        self.get_or_create(CodeElementKind::Type, &name, type_fqn, assembly, Some(parent))
    }

    /// Locate or create the node for `element`, creating missing ancestors on the way.
    fn upsert(&mut self, element: &ParsedCodeElement) -> NodeId {
        let fqn = element.fully_qualified_name.as_str();
        let assembly = element.containing_assembly_name.as_str();
        let parent_fqn = element.parent_fully_qualified_name.as_deref();

        let id = match element.kind {
            CodeElementKind::Assembly => self.ensure_assembly(fqn),
            CodeElementKind::Namespace => self.ensure_namespace(fqn, assembly),
            CodeElementKind::Type => self.ensure_type(fqn, parent_fqn, assembly),
            CodeElementKind::Member => {
                if let Some(id) = self.resolve(CodeElementKind::Member, fqn) {
                    id
                } else {
                    let type_fqn = parent_fqn.map_or_else(|| namespace_of(fqn), ToString::to_string);
                    let parent = self.ensure_type(&type_fqn, None, assembly);

                    // Rebase onto the declaring type's canonical name when it was found through its dotted form
                    let canonical_type = &self.nodes[parent.0].fully_qualified_name;
                    let member_fqn = match fqn.strip_prefix(type_fqn.as_str()) {
                        Some(rest) if *canonical_type != type_fqn => format!("{canonical_type}{rest}"),
                        _ => fqn.to_string(),
                    };

                    self.get_or_create(CodeElementKind::Member, &element.name, &member_fqn, assembly, Some(parent))
                }
            }
        };

        let node = &mut self.nodes[id.0];
        if node.synthesized {
            node.synthesized = false;
            node.name.clone_from(&element.name);
        }

        if is_sentinel(&node.containing_assembly_name) && !is_sentinel(assembly) {
            node.containing_assembly_name = assembly.to_string();
        }

        if node.member_kind.is_none() {
            node.member_kind = element.member_kind;
        }

        if node.source.is_none() {
            node.source.clone_from(&element.source);
        }

        for (&metric, &value) in &element.metrics {
            match node.metrics.get(&metric) {
                None => {
                    let _ = node.metrics.insert(metric, value);
                }
                Some(existing) if (*existing - value).abs() > f64::EPSILON => {
                    log::debug!(
                        target: LOG_TARGET,
                        "Keeping {metric} = {existing} for '{fqn}', ignoring conflicting value {value}"
                    );
                }
                Some(_) => {}
            }
        }

        id
    }

    /// Add one to a violation count on a node.
    pub(super) fn count_violation(&mut self, id: NodeId, metric: MetricIdentifier) {
        *self.nodes[id.0].metrics.entry(metric).or_insert(0.0) += 1.0;
    }

    /// Add the violation counts of every descendant to each ancestor's own count.
    fn roll_up_violations(&mut self) {
        let assemblies = self.assemblies.clone();
        for id in assemblies {
            let _ = self.roll_up(id);
        }
    }

    fn roll_up(&mut self, id: NodeId) -> BTreeMap<MetricIdentifier, f64> {
        let children = self.nodes[id.0].children.clone();
        let mut sums: BTreeMap<MetricIdentifier, f64> = BTreeMap::new();
        for child in children {
            for (metric, value) in self.roll_up(child) {
                *sums.entry(metric).or_insert(0.0) += value;
            }
        }

        let node = &mut self.nodes[id.0];
        for metric in MetricIdentifier::owned_by(ParserFamily::Findings) {
            if let Some(&sum) = sums.get(&metric) {
                *node.metrics.entry(metric).or_insert(0.0) += sum;
            }
        }

        MetricIdentifier::owned_by(ParserFamily::Findings)
            .filter_map(|metric| node.metrics.get(&metric).map(|&value| (metric, value)))
            .collect()
    }

    fn sort_children(&mut self) {
        let keys: Vec<(CodeElementKind, String)> = self
            .nodes
            .iter()
            .map(|node| (node.kind, node.fully_qualified_name.clone()))
            .collect();

        for node in &mut self.nodes {
            node.children.sort_by(|a, b| keys[a.0].cmp(&keys[b.0]));
        }
        self.assemblies.sort_by(|a, b| keys[a.0].cmp(&keys[b.0]));
    }
}

/// The FQN with nested-type separators replaced by `.`, ignoring the parameter list.
fn dotted(fqn: &str) -> String {
    match fqn.split_once('(') {
        Some((head, tail)) => format!("{}({tail}", head.replace('+', ".")),
        None => fqn.replace('+', "."),
    }
}

/// Everything before the last top-level dot of a type FQN, or the global namespace.
fn namespace_of(fqn: &str) -> String {
    let head = fqn.split('(').next().unwrap_or(fqn).trim_end_matches('.');
    match head.rsplit_once('.') {
        Some((namespace, _)) if !namespace.trim_end_matches('.').is_empty() => namespace.trim_end_matches('.').to_string(),
        _ => GLOBAL_NAMESPACE.to_string(),
    }
}

/// Merge validated documents into one tree.
///
/// Documents are merged in canonical order (family, then path) so the result
/// does not depend on input order. Unattributed findings are placed by source
/// position once every element is in the tree, then violation counts are
/// rolled up. `fallback_solution_name` is used when no structural document
/// names the solution.
#[must_use]
pub fn build_tree(documents: &[ParsedMetricsDocument], fallback_solution_name: &str) -> AggregationTree {
    let mut ordered: Vec<&ParsedMetricsDocument> = documents.iter().collect();
    ordered.sort_by(|a, b| (a.family, &a.source_path).cmp(&(b.family, &b.source_path)));

    let mut tree = AggregationTree::default();

    for document in &ordered {
        for element in &document.elements {
            if element.fully_qualified_name.trim().is_empty() && element.kind != CodeElementKind::Namespace {
                log::debug!(target: LOG_TARGET, "Ignoring {} element without a name", element.kind);
                continue;
            }

            let _ = tree.upsert(element);
        }
    }

    tree.solution_name = ordered
        .iter()
        .filter(|document| document.family == ParserFamily::Structure)
        .filter_map(|document| document.solution_name.as_deref())
        .filter(|name| !name.trim().is_empty())
        .last()
        .unwrap_or(fallback_solution_name)
        .to_string();

    let findings: Vec<_> = ordered
        .iter()
        .flat_map(|document| &document.unattributed_findings)
        .collect();
    attribute_findings(&mut tree, findings);

    tree.roll_up_violations();
    tree.sort_children();

    log::info!(
        target: LOG_TARGET,
        "Built tree for '{}' with {} nodes from {} documents",
        tree.solution_name,
        tree.len(),
        documents.len()
    );

    tree
}
