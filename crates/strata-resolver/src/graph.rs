//! The per-request dependency graph produced by resolution.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use strata_core::package::DepKind;
use strata_core::variant::Configuration;
use strata_core::version::Version;

/// A node in the resolved dependency graph: one package pinned to a
/// version and a fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub name: String,
    pub version: Version,
    pub config: Configuration,
}

impl fmt::Display for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)?;
        if !self.config.is_empty() {
            write!(f, " {}", self.config)?;
        }
        Ok(())
    }
}

/// Edge label: the usage kind of the dependency.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedEdge {
    pub kind: DepKind,
}

/// A resolved dependency graph backed by petgraph.
#[derive(Debug)]
pub struct ResolveGraph {
    graph: DiGraph<ResolvedNode, ResolvedEdge>,
    /// Lookup from package name to node index (one node per package).
    index: HashMap<String, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl ResolveGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Add a node. The caller guarantees one node per package name.
    pub fn add_node(&mut self, node: ResolvedNode) -> NodeIndex {
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(name, idx);
        idx
    }

    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    /// Add a dependency edge from `from` to `to`, deduplicating.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: ResolvedEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &ResolvedNode {
        &self.graph[idx]
    }

    /// All resolved nodes sorted by name (excluding the root).
    pub fn all_nodes(&self) -> Vec<&ResolvedNode> {
        let mut nodes: Vec<&ResolvedNode> = self
            .graph
            .node_indices()
            .filter(|&idx| Some(idx) != self.root)
            .map(|idx| &self.graph[idx])
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        nodes
    }

    /// Direct dependencies of a node, sorted by dependency name.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, ResolvedEdge)> {
        let mut deps: Vec<(NodeIndex, ResolvedEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Reverse dependencies (who depends on this node), sorted by name.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, ResolvedEdge)> {
        let mut deps: Vec<(NodeIndex, ResolvedEdge)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), *e.weight()))
            .collect();
        deps.sort_by(|a, b| self.graph[a.0].name.cmp(&self.graph[b.0].name));
        deps
    }

    /// Render the dependency tree with box-drawing connectors.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let root = match self.root {
            Some(r) => r,
            None => return output,
        };
        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = std::collections::HashSet::new();
        visited.insert(root);

        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, (idx, edge)) in deps.iter().enumerate() {
            self.print_subtree(&mut output, *idx, *edge, "", i == count - 1, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: ResolvedEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut std::collections::HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} [{}]\n", edge.kind));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, edge)) in deps.iter().enumerate() {
            self.print_subtree(
                output,
                *child,
                *edge,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }
        visited.remove(&idx);
    }

    /// Find the path from the root to a named package, for "why is this
    /// in my graph" queries.
    pub fn find_path(&self, target: &str) -> Option<Vec<&ResolvedNode>> {
        let root = self.root?;
        let target = self.find(target)?;
        let mut path = Vec::new();
        let mut visited = std::collections::HashSet::new();
        if self.dfs_path(root, target, &mut path, &mut visited) {
            Some(path.iter().map(|&idx| &self.graph[idx]).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut std::collections::HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for (child, _) in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolveGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(name: &str, version: &str) -> ResolvedNode {
        ResolvedNode {
            name: name.to_string(),
            version: Version::parse(version),
            config: Configuration::new(),
        }
    }

    fn edge() -> ResolvedEdge {
        ResolvedEdge { kind: DepKind::Both }
    }

    #[test]
    fn add_and_find() {
        let mut g = ResolveGraph::new();
        let idx = g.add_node(make_node("zlib", "1.2.11"));
        assert_eq!(g.find("zlib"), Some(idx));
        assert_eq!(g.node(idx).version.as_str(), "1.2.11");
    }

    #[test]
    fn edges_are_deduplicated() {
        let mut g = ResolveGraph::new();
        let a = g.add_node(make_node("a", "1"));
        let b = g.add_node(make_node("b", "1"));
        g.add_edge(a, b, edge());
        g.add_edge(a, b, edge());
        assert_eq!(g.dependencies_of(a).len(), 1);
    }

    #[test]
    fn tree_rendering() {
        let mut g = ResolveGraph::new();
        let root = g.add_node(make_node("mesa", "21.2.1"));
        g.set_root(root);
        let zlib = g.add_node(make_node("zlib", "1.2.11"));
        let expat = g.add_node(make_node("expat", "2.4.1"));
        g.add_edge(root, zlib, edge());
        g.add_edge(root, expat, edge());

        let tree = g.print_tree(None);
        assert!(tree.contains("mesa@21.2.1"));
        assert!(tree.contains("zlib@1.2.11"));
        assert!(tree.contains("expat@2.4.1"));
        // children are sorted by name: expat before zlib
        assert!(tree.find("expat").unwrap() < tree.find("zlib").unwrap());
    }

    #[test]
    fn find_path_through_graph() {
        let mut g = ResolveGraph::new();
        let root = g.add_node(make_node("mesa", "21.2.1"));
        g.set_root(root);
        let llvm = g.add_node(make_node("llvm", "12.0.0"));
        let zlib = g.add_node(make_node("zlib", "1.2.11"));
        g.add_edge(root, llvm, edge());
        g.add_edge(llvm, zlib, edge());

        let path = g.find_path("zlib").unwrap();
        let names: Vec<&str> = path.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["mesa", "llvm", "zlib"]);
        assert!(g.find_path("missing").is_none());
    }

    #[test]
    fn all_nodes_sorted_excludes_root() {
        let mut g = ResolveGraph::new();
        let root = g.add_node(make_node("mesa", "21.2.1"));
        g.set_root(root);
        g.add_node(make_node("zlib", "1.2.11"));
        g.add_node(make_node("expat", "2.4.1"));

        let names: Vec<&str> = g.all_nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["expat", "zlib"]);
    }
}
