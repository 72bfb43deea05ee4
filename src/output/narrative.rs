// Human-readable narrative rendered from a structured report

use crate::config::{Config, MetricsConfig, ReportConfig};
use crate::error::Result;
use crate::output::report::AnalysisReport;
use crate::output::templates::{TemplateEngine, REPORT_TEMPLATE};
use serde::Serialize;

#[derive(Serialize)]
struct NarrativeView<'a> {
    project: &'a str,
    root: &'a str,
    modules: usize,
    edges: usize,
    exports: usize,
    average_complexity: f64,
    density: f64,
    average_dependencies: f64,
    max_instability: f64,
    strategy: String,
    cycles: Vec<String>,
    cycles_truncated: bool,
    layers: Vec<LayerView<'a>>,
    max_layer_modules: usize,
    coupled: Vec<CoupledView<'a>>,
    external: Vec<&'a str>,
    max_external: usize,
    buckets: Vec<BucketView>,
    diagnostics: Vec<String>,
    recommendations: Vec<String>,
}

#[derive(Serialize)]
struct LayerView<'a> {
    level: usize,
    members: &'a [String],
}

#[derive(Serialize)]
struct CoupledView<'a> {
    name: &'a str,
    afferent: usize,
    efferent: usize,
    instability: f64,
}

#[derive(Serialize)]
struct BucketView {
    label: String,
    count: usize,
}

/// Renders `AnalysisReport`s as plain text
pub struct NarrativeRenderer {
    engine: TemplateEngine,
    project: String,
    report: ReportConfig,
    metrics: MetricsConfig,
}

impl NarrativeRenderer {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new()?,
            project: config.project.name.clone(),
            report: config.report.clone(),
            metrics: config.metrics.clone(),
        })
    }

    /// Render the narrative. Output depends only on the report and settings.
    pub fn render(&self, report: &AnalysisReport) -> Result<String> {
        let metrics = &report.metrics;
        let dist = &metrics.complexity_distribution;
        let bounds = &self.metrics;

        let view = NarrativeView {
            project: &self.project,
            root: &report.root,
            modules: metrics.total_modules,
            edges: metrics.total_internal_edges,
            exports: metrics.total_exports,
            average_complexity: metrics.average_complexity,
            density: metrics.dependency_density,
            average_dependencies: metrics.average_dependencies_per_module,
            max_instability: metrics.max_instability,
            strategy: report.layering_strategy.to_string(),
            cycles: report
                .circular_dependencies
                .iter()
                .map(|cycle| format_cycle(cycle))
                .collect(),
            cycles_truncated: report.cycles_truncated,
            layers: report
                .dependency_layers
                .iter()
                .map(|(&level, members)| LayerView { level, members })
                .collect(),
            max_layer_modules: self.report.max_layer_modules,
            coupled: metrics
                .most_coupled(self.report.top_coupled)
                .into_iter()
                .map(|(name, m)| CoupledView {
                    name,
                    afferent: m.afferent_coupling,
                    efferent: m.efferent_coupling,
                    instability: m.instability,
                })
                .collect(),
            external: report.external_dependencies.iter().map(String::as_str).collect(),
            max_external: self.report.max_external,
            buckets: vec![
                BucketView {
                    label: format!("low (<= {})", bounds.low_max),
                    count: dist.low,
                },
                BucketView {
                    label: format!("medium ({}-{})", bounds.low_max + 1, bounds.medium_max),
                    count: dist.medium,
                },
                BucketView {
                    label: format!("high ({}-{})", bounds.medium_max + 1, bounds.high_max),
                    count: dist.high,
                },
                BucketView {
                    label: format!("very high (> {})", bounds.high_max),
                    count: dist.very_high,
                },
            ],
            diagnostics: report.diagnostics.iter().map(|d| d.to_string()).collect(),
            recommendations: report.recommendations.iter().map(|r| r.to_string()).collect(),
        };

        self.engine.render(REPORT_TEMPLATE, &view)
    }
}

/// `a -> b -> c -> a`
fn format_cycle(cycle: &[String]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first);
    }
    parts.join(" -> ")
}
