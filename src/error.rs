use std::path::PathBuf;
use thiserror::Error;

/// Strata error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Duplicate module name '{module}': {path} collides with {existing}")]
    DuplicateModuleName {
        module: String,
        path: String,
        existing: String,
    },

    #[error("Cycle enumeration stopped after {found} cycles: {reason}")]
    CycleEnumerationLimitExceeded { found: usize, reason: String },

    #[error("Cannot read {path}: {message}")]
    UnreadableFile { path: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Parser error: {0}")]
    Parser(String),
}

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error for a source file
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate module name error
    pub fn duplicate_module(
        module: impl Into<String>,
        path: impl Into<String>,
        existing: impl Into<String>,
    ) -> Self {
        Error::DuplicateModuleName {
            module: module.into(),
            path: path.into(),
            existing: existing.into(),
        }
    }

    /// Create a parser setup error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Source path the error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::Parse { path, .. }
            | Error::DuplicateModuleName { path, .. }
            | Error::UnreadableFile { path, .. } => Some(path),
            _ => None,
        }
    }
}
