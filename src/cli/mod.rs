//! CLI module for Strata

mod args;

pub use args::{Args, Command, OutputFormat};

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::init_logger;
use crate::output::NarrativeRenderer;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Analyze {
            path,
            config,
            format,
            output,
            exclude,
            exclude_dir,
            source_root,
            top,
            sequential,
            verbose,
            quiet,
            no_color,
        } => {
            init_logger(verbose, quiet, no_color);

            // CLI values take precedence over the config file
            let mut cfg = Config::discover(config.as_deref())?;
            cfg.merge_cli(exclude, exclude_dir, source_root, top, sequential);
            cfg.validate()?;

            if !path.exists() {
                return Err(Error::PathNotFound(path));
            }

            if cfg.project.name == "Untitled Project" || cfg.project.name.is_empty() {
                cfg.project.name = project_name(&path);
            }
            debug!(
                path = %path.display(),
                format = ?format,
                languages = ?cfg.analysis.languages,
                parallel = cfg.analysis.parallel,
                "starting analysis"
            );

            let analyzer = Analyzer::new(cfg)?.with_progress(verbose && !quiet);
            let report = analyzer.analyze(&path)?;

            let rendered = match format {
                OutputFormat::Text => NarrativeRenderer::new(analyzer.config())?.render(&report)?,
                OutputFormat::Json => report.to_json()?,
            };

            write_report(rendered, output.as_deref())
        }

        Command::Config { config } => {
            let cfg = Config::discover(config.as_deref())?;
            print!("{}", cfg.to_toml()?);
            Ok(())
        }

        Command::Version => {
            println!("strata {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Name of the analyzed directory, for reports without a configured name
fn project_name(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or("Project")
        .to_string()
}

/// Write to `output`, or stdout when absent
fn write_report(mut rendered: String, output: Option<&Path>) -> Result<()> {
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, rendered)?;
            info!("Report written to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_name_from_directory() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("billing");
        std::fs::create_dir(&project).unwrap();
        assert_eq!(project_name(&project), "billing");
    }

    #[test]
    fn test_project_name_fallback() {
        assert_eq!(project_name(Path::new("/definitely/not/here")), "Project");
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("report.txt");
        write_report("hello".to_string(), Some(&target)).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello\n");
    }
}
