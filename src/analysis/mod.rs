// Analysis pipeline: extraction, aggregation, graph, cycles, layers, metrics

pub mod cycles;
pub mod diagnostics;
pub mod graph;
pub mod layers;
pub mod metrics;

pub use cycles::*;
pub use diagnostics::*;
pub use graph::*;
pub use layers::*;
pub use metrics::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{AnalysisReport, ReportInputs, ReportSynthesizer};
use crate::parser::{ExtractorRegistry, ModuleInfo, ModuleNamer};
use crate::source::{SourceFile, SourceReader};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Main analyzer that orchestrates the analysis pipeline
pub struct Analyzer {
    config: Config,
    registry: ExtractorRegistry,
    namer: ModuleNamer,
    show_progress: bool,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let registry = ExtractorRegistry::from_languages(&config.analysis.languages)?;
        let namer = ModuleNamer::new(&config.analysis.source_roots);

        Ok(Self {
            config,
            registry,
            namer,
            show_progress: false,
        })
    }

    /// Show a progress bar during extraction
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read and analyze the source tree under `root`
    pub fn analyze(&self, root: &Path) -> Result<AnalysisReport> {
        let reader = SourceReader::new(&self.config.analysis)?;
        let set = reader.read(root, &self.registry)?;

        let mut report = self.analyze_sources(&root.display().to_string(), set.files);
        if !set.diagnostics.is_empty() {
            let mut diagnostics = set.diagnostics;
            diagnostics.append(&mut report.diagnostics);
            report.diagnostics = diagnostics;
        }
        Ok(report)
    }

    /// Analyze an in-memory file set, in discovery order.
    ///
    /// Never fails: per-file problems become diagnostics on the report.
    pub fn analyze_sources(&self, root: &str, files: Vec<SourceFile>) -> AnalysisReport {
        let mut diagnostics = Vec::new();

        let extracted = self.extract_all(&files);
        let mut modules = self.aggregate(extracted, &mut diagnostics);

        let mut platform = self.registry.platform_modules();
        platform.extend(self.config.analysis.platform_modules.iter().cloned());
        let graph = GraphBuilder::new(platform).build(&mut modules);

        let cycles = CycleDetector::new(&self.config.cycles).detect(&graph);
        if let Some(err) = cycles.limit_error() {
            diagnostics.push(Diagnostic::from_error(&err));
        }

        let layers = LayeringEngine::new().assign(&graph);
        let metrics = MetricsCalculator::new(&self.config.metrics).calculate(&graph, &modules);

        info!(
            modules = metrics.total_modules,
            edges = metrics.total_internal_edges,
            cycles = cycles.len(),
            layers = layers.depth(),
            diagnostics = diagnostics.len(),
            "analysis complete"
        );

        ReportSynthesizer::new(&self.config.report).synthesize(ReportInputs {
            root,
            modules,
            graph: &graph,
            cycles,
            layers,
            metrics,
            diagnostics,
        })
    }

    /// Map step: one extraction per handled file, results in input order
    fn extract_all(&self, files: &[SourceFile]) -> Vec<Result<ModuleInfo>> {
        let progress = self.progress_bar(files.len());

        let extract = |file: &SourceFile| {
            let result = self.extract_one(file);
            if let Some(pb) = &progress {
                pb.set_message(file.relative_path.clone());
                pb.inc(1);
            }
            result
        };

        let results: Vec<Result<ModuleInfo>> = if self.config.analysis.parallel {
            files.par_iter().filter_map(extract).collect()
        } else {
            files.iter().filter_map(extract).collect()
        };

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        debug!(files = files.len(), extracted = results.len(), "extraction finished");
        results
    }

    /// `None` when no registered extractor handles the file
    fn extract_one(&self, file: &SourceFile) -> Option<Result<ModuleInfo>> {
        let extractor = self.registry.for_path(&file.relative_path)?;
        Some(extractor.extract(file, &self.namer))
    }

    /// Reduce step: keep the first module per name, record everything else
    fn aggregate(
        &self,
        extracted: Vec<Result<ModuleInfo>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ModuleInfo> {
        let mut modules: Vec<ModuleInfo> = Vec::with_capacity(extracted.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for result in extracted {
            let module = match result {
                Ok(module) => module,
                Err(err) => {
                    warn!("{}", err);
                    diagnostics.push(Diagnostic::from_error(&err));
                    continue;
                }
            };

            if let Some(&existing) = seen.get(&module.module_name) {
                let err = Error::duplicate_module(
                    &module.module_name,
                    &module.file_path,
                    &modules[existing].file_path,
                );
                warn!("{}", err);
                diagnostics.push(Diagnostic::from_error(&err));
                continue;
            }

            seen.insert(module.module_name.clone(), modules.len());
            modules.push(module);
        }
        modules
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}
