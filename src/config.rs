use crate::error::{Error, Result};
use crate::parser::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "strata.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub analysis: AnalysisConfig,
    pub cycles: CycleConfig,
    pub metrics: MetricsConfig,
    pub report: ReportConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

/// Source discovery and extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory names pruned anywhere in the tree
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against `/`-separated relative paths
    pub exclude: Vec<String>,
    /// Leading path components stripped before naming modules
    pub source_roots: Vec<String>,
    pub languages: Vec<Language>,
    /// Extra module names treated as platform noise
    pub platform_modules: Vec<String>,
    pub parallel: bool,
    pub follow_links: bool,
}

/// Bounds on elementary cycle enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub max_cycles: usize,
    pub max_search_steps: usize,
}

/// Complexity bucket upper bounds (inclusive)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub low_max: usize,
    pub medium_max: usize,
    pub high_max: usize,
}

/// Narrative report settings and recommendation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub max_layer_modules: usize,
    pub top_coupled: usize,
    pub max_external: usize,
    pub instability_threshold: f64,
    pub density_threshold: f64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: [
                ".git",
                ".hg",
                ".svn",
                "__pycache__",
                ".mypy_cache",
                ".pytest_cache",
                ".tox",
                ".eggs",
                "venv",
                ".venv",
                "env",
                "node_modules",
                "build",
                "dist",
                "target",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclude: Vec::new(),
            source_roots: vec!["src".to_string()],
            languages: vec![Language::Python, Language::JavaScript, Language::TypeScript],
            platform_modules: Vec::new(),
            parallel: true,
            follow_links: false,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_cycles: 10_000,
            max_search_steps: 2_000_000,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            low_max: 5,
            medium_max: 15,
            high_max: 30,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_layer_modules: 10,
            top_coupled: 10,
            max_external: 20,
            instability_threshold: 0.8,
            density_threshold: 0.3,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `strata.toml` in the working directory
    /// when present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Render the config as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        exclude: Vec<String>,
        exclude_dirs: Vec<String>,
        source_roots: Vec<String>,
        top: Option<usize>,
        sequential: bool,
    ) {
        self.analysis.exclude.extend(exclude);
        self.analysis.exclude_dirs.extend(exclude_dirs);

        if !source_roots.is_empty() {
            self.analysis.source_roots = source_roots;
        }

        if let Some(n) = top {
            self.report.top_coupled = n;
        }

        if sequential {
            self.analysis.parallel = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let metrics = &self.metrics;
        if !(metrics.low_max < metrics.medium_max && metrics.medium_max < metrics.high_max) {
            return Err(Error::config_validation(
                "complexity bounds must satisfy low_max < medium_max < high_max",
            ));
        }

        let report = &self.report;
        if !(0.0..=1.0).contains(&report.instability_threshold) {
            return Err(Error::config_validation(
                "instability_threshold must be between 0 and 1",
            ));
        }

        if !(report.density_threshold > 0.0 && report.density_threshold <= 1.0) {
            return Err(Error::config_validation(
                "density_threshold must be in (0, 1]",
            ));
        }

        if report.max_layer_modules == 0 || report.top_coupled == 0 || report.max_external == 0 {
            return Err(Error::config_validation(
                "report display caps must be at least 1",
            ));
        }

        if self.cycles.max_cycles == 0 || self.cycles.max_search_steps == 0 {
            return Err(Error::config_validation("cycle limits must be at least 1"));
        }

        if self.analysis.languages.is_empty() {
            return Err(Error::config_validation("at least one language required"));
        }

        for pattern in &self.analysis.exclude {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.name, "Untitled Project");
        assert_eq!(config.metrics.low_max, 5);
        assert_eq!(config.metrics.medium_max, 15);
        assert_eq!(config.metrics.high_max, 30);
        assert_eq!(config.report.instability_threshold, 0.8);
        assert_eq!(config.report.density_threshold, 0.3);
        assert!(config.analysis.parallel);
        assert!(config.analysis.exclude_dirs.contains(&".git".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[project]
name = "My Project"

[analysis]
source_roots = ["lib"]
languages = ["python"]
platform_modules = ["django"]

[metrics]
low_max = 3

[report]
top_coupled = 5
density_threshold = 0.5
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.project.name, "My Project");
        assert_eq!(config.analysis.source_roots, vec!["lib".to_string()]);
        assert_eq!(config.analysis.languages, vec![Language::Python]);
        assert_eq!(config.analysis.platform_modules, vec!["django".to_string()]);
        assert_eq!(config.metrics.low_max, 3);
        assert_eq!(config.metrics.medium_max, 15);
        assert_eq!(config.report.top_coupled, 5);
        assert_eq!(config.report.density_threshold, 0.5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/strata.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[project]\nname = \"Explicit\"").unwrap();
        let config = Config::discover(Some(file.path())).unwrap();
        assert_eq!(config.project.name, "Explicit");

        assert!(Config::discover(Some(Path::new("/nonexistent/strata.toml"))).is_err());
    }

    #[test]
    fn test_load_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[metrics]\nlow_max = 40").unwrap();
        let result = Config::load(file.path());
        assert!(matches!(result, Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_load_unknown_language() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nlanguages = [\"cobol\"]").unwrap();
        let result = Config::load(file.path());
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_validation_bucket_order() {
        let mut config = Config::default();
        config.metrics.medium_max = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_instability_threshold() {
        let mut config = Config::default();
        config.report.instability_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_density_threshold() {
        let mut config = Config::default();
        config.report.density_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_caps() {
        let mut config = Config::default();
        config.report.top_coupled = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cycles.max_cycles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_glob() {
        let mut config = Config::default();
        config.analysis.exclude.push("[unclosed".to_string());
        assert!(matches!(config.validate(), Err(Error::GlobPattern(_))));
    }

    #[test]
    fn test_merge_cli_excludes() {
        let mut config = Config::default();
        let initial_dirs = config.analysis.exclude_dirs.len();
        config.merge_cli(
            vec!["legacy/**".to_string()],
            vec!["vendor".to_string()],
            vec![],
            None,
            false,
        );
        assert_eq!(config.analysis.exclude, vec!["legacy/**".to_string()]);
        assert_eq!(config.analysis.exclude_dirs.len(), initial_dirs + 1);
        assert_eq!(config.analysis.source_roots, vec!["src".to_string()]);
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = Config::default();
        config.merge_cli(vec![], vec![], vec!["lib".to_string()], Some(3), true);
        assert_eq!(config.analysis.source_roots, vec!["lib".to_string()]);
        assert_eq!(config.report.top_coupled, 3);
        assert!(!config.analysis.parallel);
    }

    #[test]
    fn test_toml_round_trip_keeps_defaults() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[report]"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.report.max_external, 20);
        assert_eq!(parsed.analysis.languages.len(), 3);
    }
}
