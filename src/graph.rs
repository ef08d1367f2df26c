//! Layer dependency graph.
//!
//! Built from the edges of a [`LocalizationReport`]; used to present the
//! dependency structure and to order layers so dependencies come before the
//! layers that use them.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use crate::localize::LocalizationReport;

/// Directed graph from each layer to the files it depends on.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    /// Nodes in insertion order, used when no topological order exists
    discovery: Vec<String>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of a finished session. Every discovered layer, asset
    /// and unresolved path becomes a node, in discovery order.
    pub fn from_report(report: &LocalizationReport) -> Self {
        let mut graph = Self::new();
        for node in report.layers.iter().chain(&report.assets).chain(&report.unresolved) {
            graph.ensure_node(node);
        }
        for (from, to) in &report.edges {
            graph.add_dependency(from, to);
        }
        graph
    }

    fn ensure_node(&mut self, node: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(node) {
            index
        } else {
            let index = self.graph.add_node(node.to_string());
            self.node_map.insert(node.to_string(), index);
            self.discovery.push(node.to_string());
            index
        }
    }

    /// Records that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Returns `true` when some layer depends on itself, directly or not.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Nodes ordered so dependencies come before their dependents.
    ///
    /// Cyclic graphs have no such order; discovery order is returned instead.
    pub fn topological_order(&self) -> Vec<String> {
        match toposort(&self.graph, None) {
            Ok(indices) => indices.into_iter().rev().map(|idx| self.graph[idx].clone()).collect(),
            Err(cycle) => {
                tracing::debug!(
                    "Dependency cycle through {}, using discovery order",
                    self.graph[cycle.node_id()]
                );
                self.discovery.clone()
            }
        }
    }

    /// Direct dependencies of `node`, in the order they were added.
    pub fn direct_dependencies(&self, node: &str) -> Vec<String> {
        let Some(&index) = self.node_map.get(node) else {
            return Vec::new();
        };
        // petgraph yields neighbors most recent first.
        let mut deps: Vec<String> = self.graph.neighbors(index).map(|idx| self.graph[idx].clone()).collect();
        deps.reverse();
        deps
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Renders the dependencies reachable from `root` as a tree.
    ///
    /// A node reached a second time is printed once more, marked, without
    /// its children.
    pub fn to_tree_string(&self, root: &str) -> String {
        let mut result = format!("{root}\n");
        let mut visited = HashSet::from([root.to_string()]);
        let deps = self.direct_dependencies(root);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        node: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(node.to_string()) {
            result.push_str(&format!("{prefix}{connector}{node} (already listed)\n"));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{node}\n"));

        let deps = self.direct_dependencies(node);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }
    }
}
