// Module dependency graph backed by petgraph

use crate::parser::{root_segment, ModuleInfo};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Directed "depends on" graph over module names.
///
/// Node indices follow discovery order, so iterating `0..node_count()` visits
/// modules in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    /// Tokens that name neither a known module nor a platform module
    pub external_dependencies: BTreeSet<String>,
    /// Known modules that are the target of at least one edge
    pub internal_dependencies: BTreeSet<String>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module node, returning the existing index if already present
    pub fn add_module(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Add the edge `from -> to` between known modules.
    ///
    /// Returns false if either end is unknown. Repeated edges are stored once.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => {
                self.graph.update_edge(a, b, ());
                self.internal_dependencies.insert(to.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn name_of(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Module names in discovery order
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(move |idx| self.graph[idx].as_str())
    }

    /// Direct dependencies of a node, in discovery order
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        next.sort();
        next.dedup();
        next
    }

    /// Number of internal edges pointing at a node
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .count()
    }

    /// All edges as `(source, target)` name pairs
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].as_str(), self.graph[b].as_str()))
            .collect()
    }

    /// Adjacency list keyed by module name, targets sorted by name
    pub fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let mut targets: Vec<String> = self
                    .successors(idx)
                    .into_iter()
                    .map(|t| self.graph[t].clone())
                    .collect();
                targets.sort();
                (self.graph[idx].clone(), targets)
            })
            .collect()
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, ()> {
        &self.graph
    }
}

/// Builds a `DependencyGraph` from extracted modules
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    platform_modules: BTreeSet<String>,
}

impl GraphBuilder {
    /// Create a builder that ignores the given platform module names
    pub fn new(platform_modules: BTreeSet<String>) -> Self {
        Self { platform_modules }
    }

    /// Build the graph and fill in each module's `dependents`.
    ///
    /// `modules` must be in discovery order with unique names.
    pub fn build(&self, modules: &mut [ModuleInfo]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for module in modules.iter_mut() {
            module.dependents.clear();
            graph.add_module(&module.module_name);
        }

        // First segments of known names: `backend` for `backend.db`, `ui` for `ui/button`
        let internal_roots: BTreeSet<String> = modules
            .iter()
            .map(|m| root_segment(&m.module_name).to_string())
            .collect();

        let mut dependents: Vec<(String, String)> = Vec::new();
        for module in modules.iter() {
            for token in &module.dependencies {
                if graph.add_edge(&module.module_name, token) {
                    dependents.push((token.clone(), module.module_name.clone()));
                } else if !self.is_noise(&internal_roots, token) {
                    graph.external_dependencies.insert(token.clone());
                }
            }
        }

        let positions: HashMap<String, usize> = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.module_name.clone(), i))
            .collect();
        for (target, source) in dependents {
            if let Some(&i) = positions.get(&target) {
                modules[i].dependents.insert(source);
            }
        }

        debug!(
            modules = graph.node_count(),
            edges = graph.edge_count(),
            external = graph.external_dependencies.len(),
            "dependency graph built"
        );
        graph
    }

    /// Unresolved tokens inside the analyzed tree or the platform carry no signal
    fn is_noise(&self, internal_roots: &BTreeSet<String>, token: &str) -> bool {
        let root = root_segment(token);
        internal_roots.contains(root)
            || self.platform_modules.contains(root)
            || self.platform_modules.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Language;

    fn module(name: &str, deps: &[&str]) -> ModuleInfo {
        let mut info = ModuleInfo::new(&format!("{}.py", name), name, Language::Python);
        for dep in deps {
            info.add_dependency(dep);
        }
        info
    }

    fn platform() -> BTreeSet<String> {
        ["os", "sys"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = GraphBuilder::default().build(&mut []);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.adjacency().is_empty());
    }

    #[test]
    fn test_edges_and_dependents() {
        let mut modules = vec![module("x", &["y"]), module("y", &["z"]), module("z", &[])];
        let graph = GraphBuilder::new(platform()).build(&mut modules);

        assert_eq!(graph.node_count(), 3);
        assert!(graph.has_edge("x", "y"));
        assert!(graph.has_edge("y", "z"));
        assert!(!graph.has_edge("z", "x"));
        assert!(modules[1].dependents.contains("x"));
        assert!(modules[2].dependents.contains("y"));
        assert!(modules[0].dependents.is_empty());
        let internal: Vec<_> = graph.internal_dependencies.iter().cloned().collect();
        assert_eq!(internal, vec!["y", "z"]);
    }

    #[test]
    fn test_external_and_platform_tokens() {
        let mut modules = vec![module("app", &["requests", "os", "sys", "db"]), module("db", &[])];
        let graph = GraphBuilder::new(platform()).build(&mut modules);

        assert_eq!(graph.edge_count(), 1);
        let external: Vec<_> = graph.external_dependencies.iter().cloned().collect();
        assert_eq!(external, vec!["requests"]);
    }

    #[test]
    fn test_token_under_known_module_is_noise() {
        let mut modules = vec![module("pkg", &[]), module("pkg.a", &["pkg.missing", "ui/none"])];
        let graph = GraphBuilder::default().build(&mut modules);
        assert!(graph.external_dependencies.contains("ui/none"));
        assert!(!graph.external_dependencies.contains("pkg.missing"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_directory_of_known_modules_is_not_external() {
        // `backend` has no module of its own, only modules beneath it
        let mut modules = vec![
            module("backend.api", &["backend", "backend.db", "requests"]),
            module("backend.db", &[]),
            module("ui/app", &["ui/missing"]),
        ];
        let graph = GraphBuilder::default().build(&mut modules);

        assert!(graph.has_edge("backend.api", "backend.db"));
        assert_eq!(graph.edge_count(), 1);
        let external: Vec<_> = graph.external_dependencies.iter().cloned().collect();
        assert_eq!(external, vec!["requests"]);
    }

    #[test]
    fn test_modules_in_discovery_order() {
        let mut modules = vec![module("b", &[]), module("a", &[]), module("c", &[])];
        let graph = GraphBuilder::default().build(&mut modules);
        let names: Vec<_> = graph.modules().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_successors_in_discovery_order() {
        let mut modules = vec![
            module("a", &["d", "b", "c"]),
            module("b", &[]),
            module("c", &[]),
            module("d", &[]),
        ];
        let graph = GraphBuilder::default().build(&mut modules);
        let a = graph.index_of("a").unwrap();
        let names: Vec<_> = graph
            .successors(a)
            .into_iter()
            .map(|i| graph.name_of(i))
            .collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_rebuild_resets_dependents() {
        let mut modules = vec![module("a", &["b"]), module("b", &[])];
        GraphBuilder::default().build(&mut modules);
        let graph = GraphBuilder::default().build(&mut modules);
        assert_eq!(modules[1].dependents.len(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_add_edge_unknown_target() {
        let mut graph = DependencyGraph::new();
        graph.add_module("a");
        assert!(!graph.add_edge("a", "b"));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.internal_dependencies.is_empty());
    }

    #[test]
    fn test_adjacency_and_edges() {
        let mut modules = vec![module("a", &["c", "b"]), module("b", &[]), module("c", &["b"])];
        let graph = GraphBuilder::default().build(&mut modules);
        let adjacency = graph.adjacency();
        assert_eq!(adjacency["a"], vec!["b", "c"]);
        assert!(adjacency["b"].is_empty());
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.in_degree(graph.index_of("b").unwrap()), 2);
    }
}
