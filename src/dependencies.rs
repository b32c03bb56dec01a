//! Dependency Analyzer
//!
//! Computes which named elements each element of a schema set references,
//! directly and transitively. The result only scopes JSON Schema export;
//! validator compilation never consults it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use tracing::{debug, warn};

use crate::bootstrap::RESERVED_BOOTSTRAP_NAME;
use crate::element::{SchemaElement, SchemaSet};

/// Name → transitively referenced names
pub type DependencyMap = BTreeMap<String, BTreeSet<String>>;

/// Names referenced by `element` itself, without following them.
///
/// `function` signatures are opaque here, matching the compiler, which never
/// checks them.
pub fn direct_dependencies(element: &SchemaElement) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect(element, &mut out);
    out.remove(RESERVED_BOOTSTRAP_NAME);
    out
}

fn collect(element: &SchemaElement, out: &mut BTreeSet<String>) {
    match element {
        SchemaElement::Literal { .. }
        | SchemaElement::SimpleType { .. }
        | SchemaElement::Enum { .. }
        | SchemaElement::Function { .. } => {}
        SchemaElement::SchemaReference { definition, .. } => {
            out.insert(definition.clone());
        }
        SchemaElement::Lazy { definition, .. }
        | SchemaElement::Record { definition, .. }
        | SchemaElement::Array { definition, .. } => collect(definition, out),
        SchemaElement::Union { definition, .. } => {
            for child in definition {
                collect(child, out);
            }
        }
        SchemaElement::Object { definition, .. } => {
            for child in definition.values() {
                collect(child, out);
            }
        }
    }
}

/// Reference graph of a schema set: an edge `a -> b` when `a` references `b`
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// Referenced names that are not defined in the set
    dangling: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn from_set(set: &SchemaSet) -> Self {
        let mut graph = DiGraph::with_capacity(set.len(), set.len() * 2);
        let mut node_indices = HashMap::with_capacity(set.len());

        for name in set.names() {
            node_indices.insert(name.clone(), graph.add_node(name.clone()));
        }

        let mut dangling = BTreeSet::new();
        for (name, element) in set.iter() {
            let from = node_indices[name];
            for target in direct_dependencies(element) {
                let to = match node_indices.get(&target) {
                    Some(&idx) => idx,
                    None => {
                        warn!(from = %name, reference = %target, "reference to undefined schema");
                        dangling.insert(target.clone());
                        let idx = graph.add_node(target.clone());
                        node_indices.insert(target, idx);
                        idx
                    }
                };
                graph.update_edge(from, to, ());
            }
        }

        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "built dependency graph");
        Self { graph, node_indices, dangling }
    }

    /// Immediate outgoing references of `name`
    pub fn refs_out(&self, name: &str) -> BTreeSet<String> {
        let Some(&idx) = self.node_indices.get(name) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Every name reachable from `name` through one or more references.
    ///
    /// `name` itself is included only when it sits on a cycle back to itself.
    pub fn closure(&self, name: &str) -> BTreeSet<String> {
        let Some(&start) = self.node_indices.get(name) else {
            return BTreeSet::new();
        };

        // Start from the direct neighbours so `name` is only reached via a cycle
        let mut reached = BTreeSet::new();
        let mut dfs = Dfs::empty(&self.graph);
        for next in self.graph.neighbors_directed(start, Direction::Outgoing) {
            dfs.move_to(next);
            while let Some(idx) = dfs.next(&self.graph) {
                reached.insert(self.graph[idx].clone());
            }
        }
        reached
    }

    /// Closure of every defined name
    pub fn dependency_map(&self) -> DependencyMap {
        self.node_indices
            .keys()
            .filter(|name| !self.dangling.contains(*name))
            .map(|name| (name.clone(), self.closure(name)))
            .collect()
    }

    /// Referenced names that no entry defines
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.dangling
    }
}

/// Transitive dependency map of a whole schema set
pub fn dependency_map(set: &SchemaSet) -> DependencyMap {
    DependencyGraph::from_set(set).dependency_map()
}
