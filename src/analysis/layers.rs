// Architectural layering by dependency depth

use crate::analysis::DependencyGraph;
use petgraph::algo::toposort;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// How a layer assignment was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayeringStrategy {
    /// Longest dependency chain on an acyclic graph
    #[default]
    Topological,
    /// Internal in-degree, used when the graph has a cycle
    InDegreeFallback,
}

impl fmt::Display for LayeringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayeringStrategy::Topological => f.write_str("topological"),
            LayeringStrategy::InDegreeFallback => f.write_str("in_degree_fallback"),
        }
    }
}

/// Layer number for every module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerAssignment {
    /// Layer -> modules on it, in discovery order. Layer 0 has no internal dependencies.
    pub layers: BTreeMap<usize, Vec<String>>,
    pub strategy: LayeringStrategy,
    #[serde(skip)]
    by_module: BTreeMap<String, usize>,
}

impl LayerAssignment {
    pub fn layer_of(&self, module: &str) -> Option<usize> {
        self.by_module.get(module).copied()
    }

    /// Number of distinct layers
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    fn from_levels(graph: &DependencyGraph, levels: &[usize], strategy: LayeringStrategy) -> Self {
        let mut assignment = LayerAssignment {
            strategy,
            ..Default::default()
        };
        for (name, &level) in graph.modules().zip(levels) {
            assignment
                .layers
                .entry(level)
                .or_default()
                .push(name.to_string());
            assignment.by_module.insert(name.to_string(), level);
        }
        assignment
    }
}

/// Assigns layers, falling back to in-degree when cycles prevent ordering
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeringEngine;

impl LayeringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn assign(&self, graph: &DependencyGraph) -> LayerAssignment {
        match toposort(graph.inner(), None) {
            Ok(order) => {
                let mut levels = vec![0usize; graph.node_count()];
                for &idx in order.iter().rev() {
                    levels[idx.index()] = graph
                        .successors(idx)
                        .into_iter()
                        .map(|dep| levels[dep.index()] + 1)
                        .max()
                        .unwrap_or(0);
                }
                debug!(layers = levels.iter().max().map_or(0, |m| m + 1), "topological layering");
                LayerAssignment::from_levels(graph, &levels, LayeringStrategy::Topological)
            }
            Err(cycle) => {
                debug!(
                    module = graph.name_of(cycle.node_id()),
                    "cycle prevents topological layering, using in-degree"
                );
                let levels: Vec<usize> = graph
                    .inner()
                    .node_indices()
                    .map(|idx| graph.in_degree(idx))
                    .collect();
                LayerAssignment::from_levels(graph, &levels, LayeringStrategy::InDegreeFallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GraphBuilder;
    use crate::parser::{Language, ModuleInfo};

    fn graph(shape: &[(&str, &[&str])]) -> DependencyGraph {
        let mut modules: Vec<ModuleInfo> = shape
            .iter()
            .map(|(name, deps)| {
                let mut info = ModuleInfo::new(&format!("{}.py", name), name, Language::Python);
                info.dependencies = deps.iter().map(|d| d.to_string()).collect();
                info
            })
            .collect();
        GraphBuilder::default().build(&mut modules)
    }

    #[test]
    fn test_chain_layers() {
        let g = graph(&[("x", &["y"]), ("y", &["z"]), ("z", &[])]);
        let layers = LayeringEngine::new().assign(&g);
        assert_eq!(layers.strategy, LayeringStrategy::Topological);
        assert_eq!(layers.layer_of("x"), Some(2));
        assert_eq!(layers.layer_of("y"), Some(1));
        assert_eq!(layers.layer_of("z"), Some(0));
        assert_eq!(layers.depth(), 3);
    }

    #[test]
    fn test_longest_path_wins() {
        // a depends on c directly and through b
        let g = graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[]), ("d", &[])]);
        let layers = LayeringEngine::new().assign(&g);
        assert_eq!(layers.layer_of("a"), Some(2));
        assert_eq!(layers.layers[&0], vec!["c", "d"]);
    }

    #[test]
    fn test_layer_members_in_discovery_order() {
        let g = graph(&[("m", &[]), ("b", &[]), ("k", &[])]);
        let layers = LayeringEngine::new().assign(&g);
        assert_eq!(layers.layers[&0], vec!["m", "b", "k"]);
    }

    #[test]
    fn test_fallback_on_cycle() {
        let g = graph(&[("x", &["y"]), ("y", &["x"]), ("z", &["x"]), ("w", &[])]);
        let layers = LayeringEngine::new().assign(&g);
        assert_eq!(layers.strategy, LayeringStrategy::InDegreeFallback);
        assert_eq!(layers.layer_of("x"), Some(2));
        assert_eq!(layers.layer_of("y"), Some(1));
        assert_eq!(layers.layer_of("z"), Some(0));
        assert_eq!(layers.layer_of("w"), Some(0));
    }

    #[test]
    fn test_empty_graph() {
        let g = graph(&[]);
        let layers = LayeringEngine::new().assign(&g);
        assert!(layers.layers.is_empty());
        assert_eq!(layers.strategy, LayeringStrategy::Topological);
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&LayeringStrategy::InDegreeFallback).unwrap();
        assert_eq!(json, "\"in_degree_fallback\"");
        assert_eq!(LayeringStrategy::Topological.to_string(), "topological");
    }
}
