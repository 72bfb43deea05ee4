// Structured analysis report and recommendations

use crate::analysis::{
    CycleReport, DependencyGraph, Diagnostic, LayerAssignment, LayeringStrategy, Metrics,
};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::parser::ModuleInfo;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Urgency of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Urgent,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Urgent => "URGENT",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        f.write_str(label)
    }
}

/// One actionable finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
}

impl Recommendation {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Complete result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub root: String,
    pub modules: BTreeMap<String, ModuleInfo>,
    /// Module -> internal modules it depends on
    pub dependency_graph: BTreeMap<String, Vec<String>>,
    pub circular_dependencies: Vec<Vec<String>>,
    pub cycles_truncated: bool,
    pub external_dependencies: BTreeSet<String>,
    pub internal_dependencies: BTreeSet<String>,
    pub dependency_layers: BTreeMap<usize, Vec<String>>,
    pub layering_strategy: LayeringStrategy,
    pub metrics: Metrics,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_cycles(&self) -> bool {
        !self.circular_dependencies.is_empty()
    }

    /// Layer of a module, if it was analyzed
    pub fn layer_of(&self, module: &str) -> Option<usize> {
        self.dependency_layers
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == module))
            .map(|(&layer, _)| layer)
    }
}

/// Everything the synthesizer combines into a report
pub struct ReportInputs<'a> {
    pub root: &'a str,
    pub modules: Vec<ModuleInfo>,
    pub graph: &'a DependencyGraph,
    pub cycles: CycleReport,
    pub layers: LayerAssignment,
    pub metrics: Metrics,
    pub diagnostics: Vec<Diagnostic>,
}

/// Assembles the structured report and derives recommendations
#[derive(Debug, Clone, Default)]
pub struct ReportSynthesizer {
    config: ReportConfig,
}

impl ReportSynthesizer {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn synthesize(&self, inputs: ReportInputs<'_>) -> AnalysisReport {
        let recommendations = self.recommendations(&inputs.cycles, &inputs.metrics);
        AnalysisReport {
            root: inputs.root.to_string(),
            modules: inputs
                .modules
                .into_iter()
                .map(|m| (m.module_name.clone(), m))
                .collect(),
            dependency_graph: inputs.graph.adjacency(),
            circular_dependencies: inputs.cycles.cycles,
            cycles_truncated: inputs.cycles.truncated,
            external_dependencies: inputs.graph.external_dependencies.clone(),
            internal_dependencies: inputs.graph.internal_dependencies.clone(),
            dependency_layers: inputs.layers.layers,
            layering_strategy: inputs.layers.strategy,
            metrics: inputs.metrics,
            recommendations,
            diagnostics: inputs.diagnostics,
        }
    }

    /// Findings in severity order; a single INFO entry when nothing stands out
    pub fn recommendations(&self, cycles: &CycleReport, metrics: &Metrics) -> Vec<Recommendation> {
        let mut found = Vec::new();

        if !cycles.is_empty() {
            let qualifier = if cycles.truncated { "at least " } else { "" };
            found.push(Recommendation::new(
                Severity::Urgent,
                format!(
                    "Found {}{} circular {}; break them so modules can be layered",
                    qualifier,
                    cycles.len(),
                    plural(cycles.len(), "dependency chain", "dependency chains"),
                ),
            ));
        }

        let unstable = metrics.unstable_modules(self.config.instability_threshold);
        if !unstable.is_empty() {
            found.push(Recommendation::new(
                Severity::Warning,
                format!(
                    "{} {} instability above {:.2}: {}",
                    unstable.len(),
                    plural(unstable.len(), "module has", "modules have"),
                    self.config.instability_threshold,
                    summarize(&unstable, self.config.top_coupled),
                ),
            ));
        }

        let very_high = metrics.complexity_distribution.very_high;
        if very_high > 0 {
            found.push(Recommendation::new(
                Severity::Warning,
                format!(
                    "{} {} very high complexity; consider splitting {}",
                    very_high,
                    plural(very_high, "module has", "modules have"),
                    plural(very_high, "it", "them"),
                ),
            ));
        }

        if metrics.dependency_density > self.config.density_threshold {
            found.push(Recommendation::new(
                Severity::Warning,
                format!(
                    "Dependency density {:.2} exceeds {:.2}; modules are tightly interconnected",
                    metrics.dependency_density, self.config.density_threshold,
                ),
            ));
        }

        if found.is_empty() {
            found.push(Recommendation::new(
                Severity::Info,
                "No structural issues detected",
            ));
        }
        found
    }
}

fn plural<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Join names, eliding past `cap` with a `+N more` suffix
pub(crate) fn summarize<S: AsRef<str>>(names: &[S], cap: usize) -> String {
    let shown: Vec<&str> = names.iter().take(cap).map(|s| s.as_ref()).collect();
    let mut text = shown.join(", ");
    if names.len() > cap {
        text.push_str(&format!(" (+{} more)", names.len() - cap));
    }
    text
}
