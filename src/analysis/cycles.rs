// Elementary cycle enumeration (Johnson's algorithm)

use crate::analysis::DependencyGraph;
use crate::config::CycleConfig;
use crate::error::Error;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Circular dependency chains found in a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Each cycle lists `m0, m1, ..., mk`; the edge `mk -> m0` closes it
    pub cycles: Vec<Vec<String>>,
    /// Enumeration stopped at a work bound before finishing
    pub truncated: bool,
    #[serde(skip)]
    stop_reason: Option<String>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// The limit error to record when enumeration was cut short
    pub fn limit_error(&self) -> Option<Error> {
        self.stop_reason
            .as_ref()
            .map(|reason| Error::CycleEnumerationLimitExceeded {
                found: self.cycles.len(),
                reason: reason.clone(),
            })
    }
}

/// Finds every elementary cycle, within configured work bounds
#[derive(Debug, Clone)]
pub struct CycleDetector {
    max_cycles: usize,
    max_search_steps: usize,
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(&CycleConfig::default())
    }
}

/// Per-search bookkeeping, reused across start nodes
struct SearchState {
    blocked: Vec<bool>,
    blocked_by: Vec<Vec<usize>>,
    in_component: Vec<bool>,
    steps: usize,
}

/// One DFS frame: node, next successor position, whether a cycle was closed below
struct Frame {
    node: usize,
    next: usize,
    closed: bool,
}

impl CycleDetector {
    pub fn new(config: &CycleConfig) -> Self {
        Self {
            max_cycles: config.max_cycles,
            max_search_steps: config.max_search_steps,
        }
    }

    /// Enumerate cycles. Each cycle starts at its earliest-discovered module.
    pub fn detect(&self, graph: &DependencyGraph) -> CycleReport {
        let n = graph.node_count();
        let successors: Vec<Vec<usize>> = graph
            .inner()
            .node_indices()
            .map(|idx| graph.successors(idx).into_iter().map(|s| s.index()).collect())
            .collect();
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (v, targets) in successors.iter().enumerate() {
            for &w in targets {
                predecessors[w].push(v);
            }
        }

        // Nodes outside a non-trivial strongly connected component never lie on a cycle
        let mut component = vec![0usize; n];
        let mut cyclic = vec![false; n];
        for (id, scc) in tarjan_scc(graph.inner()).into_iter().enumerate() {
            let nontrivial = scc.len() > 1;
            for idx in scc {
                let v = idx.index();
                component[v] = id;
                cyclic[v] = nontrivial || successors[v].contains(&v);
            }
        }

        let mut report = CycleReport::default();
        let mut state = SearchState {
            blocked: vec![false; n],
            blocked_by: vec![Vec::new(); n],
            in_component: vec![false; n],
            steps: 0,
        };

        for start in 0..n {
            if !cyclic[start] {
                continue;
            }

            let members = self.reachable_component(start, &component, &successors, &predecessors);
            for &v in &members {
                state.in_component[v] = true;
                state.blocked[v] = false;
                state.blocked_by[v].clear();
            }

            let stop = self.circuits_from(start, &successors, &mut state, graph, &mut report);

            for &v in &members {
                state.in_component[v] = false;
            }

            if let Some(reason) = stop {
                warn!(found = report.cycles.len(), "cycle enumeration stopped: {}", reason);
                report.truncated = true;
                report.stop_reason = Some(reason);
                break;
            }
        }

        debug!(
            cycles = report.cycles.len(),
            steps = state.steps,
            "cycle detection finished"
        );
        report
    }

    /// Nodes `>= start` in `start`'s component that lie on a path from and to `start`
    fn reachable_component(
        &self,
        start: usize,
        component: &[usize],
        successors: &[Vec<usize>],
        predecessors: &[Vec<usize>],
    ) -> Vec<usize> {
        let allowed = |v: usize| v >= start && component[v] == component[start];
        let forward = reach(start, successors, allowed);
        let backward = reach(start, predecessors, allowed);
        forward
            .iter()
            .enumerate()
            .filter(|&(v, &f)| f && backward[v])
            .map(|(v, _)| v)
            .collect()
    }

    /// Johnson's CIRCUIT search from `start`, iterative.
    ///
    /// Returns the stop reason when a work bound is hit.
    fn circuits_from(
        &self,
        start: usize,
        successors: &[Vec<usize>],
        state: &mut SearchState,
        graph: &DependencyGraph,
        report: &mut CycleReport,
    ) -> Option<String> {
        let mut path = vec![start];
        let mut frames = vec![Frame {
            node: start,
            next: 0,
            closed: false,
        }];
        state.blocked[start] = true;

        while let Some(frame) = frames.last_mut() {
            let v = frame.node;

            if let Some(&w) = successors[v].get(frame.next) {
                frame.next += 1;
                state.steps += 1;
                if state.steps > self.max_search_steps {
                    return Some(format!("search step limit {} reached", self.max_search_steps));
                }
                if !state.in_component[w] {
                    continue;
                }
                if w == start {
                    // Stop only when a cycle beyond the limit exists
                    if report.cycles.len() >= self.max_cycles {
                        return Some(format!("more than {} cycles", self.max_cycles));
                    }
                    frame.closed = true;
                    report.cycles.push(
                        path.iter()
                            .map(|&i| graph.name_of(NodeIndex::new(i)).to_string())
                            .collect(),
                    );
                } else if !state.blocked[w] {
                    state.blocked[w] = true;
                    path.push(w);
                    frames.push(Frame {
                        node: w,
                        next: 0,
                        closed: false,
                    });
                }
                continue;
            }

            let closed = frame.closed;
            if closed {
                unblock(v, state);
            } else {
                for &w in &successors[v] {
                    if state.in_component[w] && !state.blocked_by[w].contains(&v) {
                        state.blocked_by[w].push(v);
                    }
                }
            }
            frames.pop();
            path.pop();
            if let Some(parent) = frames.last_mut() {
                parent.closed |= closed;
            }
        }

        None
    }
}

fn unblock(node: usize, state: &mut SearchState) {
    let mut pending = vec![node];
    while let Some(v) = pending.pop() {
        state.blocked[v] = false;
        for w in std::mem::take(&mut state.blocked_by[v]) {
            if state.blocked[w] {
                pending.push(w);
            }
        }
    }
}

/// Breadth-first reachability over `edges`, restricted to `allowed` nodes
fn reach(start: usize, edges: &[Vec<usize>], allowed: impl Fn(usize) -> bool) -> Vec<bool> {
    let mut seen = vec![false; edges.len()];
    let mut queue = VecDeque::from([start]);
    seen[start] = true;
    while let Some(v) = queue.pop_front() {
        for &w in &edges[v] {
            if !seen[w] && allowed(w) {
                seen[w] = true;
                queue.push_back(w);
            }
        }
    }
    seen
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

    fn cycles(report: &CycleReport) -> Vec<Vec<&str>> {
        report
            .cycles
            .iter()
            .map(|c| c.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_acyclic_graph() {
        let g = graph(&[("x", &["y"]), ("y", &["z"]), ("z", &[])]);
        let report = CycleDetector::default().detect(&g);
        assert!(report.is_empty());
        assert!(!report.truncated);
        assert!(report.limit_error().is_none());
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&[("x", &["y"]), ("y", &["x"])]);
        let report = CycleDetector::default().detect(&g);
        assert_eq!(cycles(&report), vec![vec!["x", "y"]]);
    }

    #[test]
    fn test_cycle_starts_at_earliest_module() {
        let g = graph(&[("c", &["a"]), ("a", &["b"]), ("b", &["c"])]);
        let report = CycleDetector::default().detect(&g);
        assert_eq!(cycles(&report), vec![vec!["c", "a", "b"]]);
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("a", &["a", "b"]), ("b", &[])]);
        let report = CycleDetector::default().detect(&g);
        assert_eq!(cycles(&report), vec![vec!["a"]]);
    }

    #[test]
    fn test_overlapping_cycles() {
        // a -> b -> a, b -> c -> b, a -> c -> a
        let g = graph(&[("a", &["b", "c"]), ("b", &["a", "c"]), ("c", &["a", "b"])]);
        let report = CycleDetector::default().detect(&g);
        let found = cycles(&report);
        assert_eq!(
            found,
            vec![
                vec!["a", "b"],
                vec!["a", "b", "c"],
                vec!["a", "c"],
                vec!["a", "c", "b"],
                vec!["b", "c"],
            ]
        );
    }

    #[test]
    fn test_separate_components() {
        let g = graph(&[
            ("a", &["b"]),
            ("b", &["a"]),
            ("c", &["d"]),
            ("d", &["e"]),
            ("e", &["c"]),
            ("f", &["a"]),
        ]);
        let report = CycleDetector::default().detect(&g);
        assert_eq!(cycles(&report), vec![vec!["a", "b"], vec!["c", "d", "e"]]);
    }

    #[test]
    fn test_cycles_are_closed_walks() {
        let g = graph(&[
            ("a", &["b", "d"]),
            ("b", &["c"]),
            ("c", &["a", "d"]),
            ("d", &["b"]),
        ]);
        let report = CycleDetector::default().detect(&g);
        assert!(!report.is_empty());
        for cycle in &report.cycles {
            for pair in cycle.windows(2) {
                assert!(g.has_edge(&pair[0], &pair[1]));
            }
            assert!(g.has_edge(cycle.last().unwrap(), &cycle[0]));
        }
    }

    #[test]
    fn test_cycle_limit_truncates() {
        let g = graph(&[("a", &["b", "c"]), ("b", &["a", "c"]), ("c", &["a", "b"])]);
        let detector = CycleDetector::new(&CycleConfig {
            max_cycles: 2,
            max_search_steps: 1_000,
        });
        let report = detector.detect(&g);
        assert_eq!(report.len(), 2);
        assert!(report.truncated);
        let err = report.limit_error().unwrap();
        assert!(matches!(err, Error::CycleEnumerationLimitExceeded { found: 2, .. }));
    }

    #[test]
    fn test_cycle_count_at_limit_is_complete() {
        let g = graph(&[("x", &["y"]), ("y", &["x"])]);
        let detector = CycleDetector::new(&CycleConfig {
            max_cycles: 1,
            max_search_steps: 1_000,
        });
        let report = detector.detect(&g);
        assert_eq!(cycles(&report), vec![vec!["x", "y"]]);
        assert!(!report.truncated);
        assert!(report.limit_error().is_none());
    }

    #[test]
    fn test_step_limit_truncates() {
        let g = graph(&[("a", &["b", "c"]), ("b", &["a", "c"]), ("c", &["a", "b"])]);
        let detector = CycleDetector::new(&CycleConfig {
            max_cycles: 100,
            max_search_steps: 3,
        });
        let report = detector.detect(&g);
        assert!(report.truncated);
        assert!(report.len() < 5);
    }

    #[test]
    fn test_deterministic() {
        let shape: &[(&str, &[&str])] = &[
            ("a", &["b", "c"]),
            ("b", &["c", "a"]),
            ("c", &["a"]),
            ("d", &["c", "d"]),
        ];
        let first = CycleDetector::default().detect(&graph(shape));
        let second = CycleDetector::default().detect(&graph(shape));
        assert_eq!(first, second);
    }
}
