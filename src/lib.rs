//! Strata - reconstruct module architecture from source trees
//!
//! Extracts imports and declarations from Python, JavaScript and TypeScript
//! files, builds the internal dependency graph, and reports circular
//! dependencies, architectural layers and coupling metrics.
//!
//! ```no_run
//! use strata::{Analyzer, Config};
//! use std::path::Path;
//!
//! let analyzer = Analyzer::new(Config::default())?;
//! let report = analyzer.analyze(Path::new("./my-project"))?;
//! println!("{}", report.to_json()?);
//! # Ok::<(), strata::Error>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod parser;
pub mod source;

// Re-export main types
pub use analysis::{Analyzer, Diagnostic, DiagnosticKind};
pub use config::Config;
pub use error::{Error, Result};
pub use output::{AnalysisReport, NarrativeRenderer};
pub use parser::{Language, ModuleInfo};
pub use source::SourceFile;
