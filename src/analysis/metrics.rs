// Coupling and complexity metrics
//
// Per module:
// - Afferent coupling (Ca): modules that depend on it
// - Efferent coupling (Ce): internal modules it depends on
// - Instability: Ce / (Ca + Ce)
// Aggregates cover totals, averages, density and the complexity histogram.

use crate::analysis::DependencyGraph;
use crate::config::MetricsConfig;
use crate::parser::ModuleInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Complexity band of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityBucket {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for ComplexityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComplexityBucket::Low => "low",
            ComplexityBucket::Medium => "medium",
            ComplexityBucket::High => "high",
            ComplexityBucket::VeryHigh => "very_high",
        };
        f.write_str(name)
    }
}

/// Metrics for a single module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetrics {
    pub afferent_coupling: usize,
    pub efferent_coupling: usize,
    /// 0.0 (stable) to 1.0 (unstable)
    pub instability: f64,
    pub complexity: usize,
}

impl ModuleMetrics {
    /// Ca + Ce
    pub fn total_coupling(&self) -> usize {
        self.afferent_coupling + self.efferent_coupling
    }
}

/// Module count per complexity bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub very_high: usize,
}

impl ComplexityDistribution {
    fn record(&mut self, bucket: ComplexityBucket) {
        match bucket {
            ComplexityBucket::Low => self.low += 1,
            ComplexityBucket::Medium => self.medium += 1,
            ComplexityBucket::High => self.high += 1,
            ComplexityBucket::VeryHigh => self.very_high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.very_high
    }
}

/// Project-wide metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub modules: BTreeMap<String, ModuleMetrics>,
    pub total_modules: usize,
    pub total_internal_edges: usize,
    pub total_external_dependencies: usize,
    pub total_exports: usize,
    pub total_complexity: usize,
    pub average_complexity: f64,
    /// edges / modules²
    pub dependency_density: f64,
    pub average_dependencies_per_module: f64,
    pub max_instability: f64,
    pub complexity_distribution: ComplexityDistribution,
}

impl Metrics {
    /// Modules ordered by Ca + Ce descending, ties by name
    pub fn most_coupled(&self, limit: usize) -> Vec<(&str, &ModuleMetrics)> {
        let mut ranked: Vec<(&str, &ModuleMetrics)> = self
            .modules
            .iter()
            .map(|(name, m)| (name.as_str(), m))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.total_coupling()
                .cmp(&a.1.total_coupling())
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Modules whose instability exceeds `threshold`, sorted by name
    pub fn unstable_modules(&self, threshold: f64) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|(_, m)| m.instability > threshold)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Computes metrics from a built graph
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    low_max: usize,
    medium_max: usize,
    high_max: usize,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new(&MetricsConfig::default())
    }
}

impl MetricsCalculator {
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            low_max: config.low_max,
            medium_max: config.medium_max,
            high_max: config.high_max,
        }
    }

    /// Bucket for a complexity score (bounds inclusive)
    pub fn bucket(&self, complexity: usize) -> ComplexityBucket {
        if complexity <= self.low_max {
            ComplexityBucket::Low
        } else if complexity <= self.medium_max {
            ComplexityBucket::Medium
        } else if complexity <= self.high_max {
            ComplexityBucket::High
        } else {
            ComplexityBucket::VeryHigh
        }
    }

    /// Calculate metrics for modules already linked by `GraphBuilder`
    pub fn calculate(&self, graph: &DependencyGraph, modules: &[ModuleInfo]) -> Metrics {
        let mut metrics = Metrics {
            total_modules: modules.len(),
            total_internal_edges: graph.edge_count(),
            total_external_dependencies: graph.external_dependencies.len(),
            ..Default::default()
        };

        for module in modules {
            let afferent = module.dependents.len();
            let efferent = module
                .dependencies
                .iter()
                .filter(|d| graph.internal_dependencies.contains(*d))
                .count();
            let instability = ratio(efferent, afferent + efferent);

            metrics.total_exports += module.exports.len();
            metrics.total_complexity += module.complexity_score;
            metrics.max_instability = metrics.max_instability.max(instability);
            metrics
                .complexity_distribution
                .record(self.bucket(module.complexity_score));

            metrics.modules.insert(
                module.module_name.clone(),
                ModuleMetrics {
                    afferent_coupling: afferent,
                    efferent_coupling: efferent,
                    instability,
                    complexity: module.complexity_score,
                },
            );
        }

        let n = modules.len();
        metrics.average_complexity = ratio(metrics.total_complexity, n);
        metrics.dependency_density = ratio(metrics.total_internal_edges, n * n);
        metrics.average_dependencies_per_module = ratio(metrics.total_internal_edges, n);
        metrics
    }
}

/// `num / den`, or 0 when `den` is 0
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
