// Source discovery: walks a root directory and reads candidate files

use crate::analysis::Diagnostic;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::parser::ExtractorRegistry;
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// One source file as handed to the extractors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the analysis root, `/`-separated
    pub relative_path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(relative_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            text: text.into(),
        }
    }
}

/// Files read from disk, in discovery order
#[derive(Debug, Default)]
pub struct SourceSet {
    pub files: Vec<SourceFile>,
    /// Files that were found but could not be read
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks a directory tree and collects files with a registered extractor
pub struct SourceReader {
    exclude_dirs: BTreeSet<String>,
    exclude: Vec<Pattern>,
    follow_links: bool,
}

impl SourceReader {
    /// Create a reader from analysis settings
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_dirs: config.exclude_dirs.iter().cloned().collect(),
            exclude,
            follow_links: config.follow_links,
        })
    }

    /// Read every handled file under `root`
    pub fn read(&self, root: &Path, registry: &ExtractorRegistry) -> Result<SourceSet> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }

        let mut set = SourceSet::default();
        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| relative_path(root, p))
                        .unwrap_or_default();
                    let err = Error::UnreadableFile {
                        path,
                        message: err.to_string(),
                    };
                    warn!("{}", err);
                    set.diagnostics.push(Diagnostic::from_error(&err));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(root, entry.path());
            if !registry.handles(&relative) || self.is_excluded_file(&relative) {
                continue;
            }

            match read_text(entry.path()) {
                Ok(text) => set.files.push(SourceFile::new(relative, text)),
                Err(message) => {
                    let err = Error::UnreadableFile {
                        path: relative,
                        message,
                    };
                    warn!("{}", err);
                    set.diagnostics.push(Diagnostic::from_error(&err));
                }
            }
        }

        debug!(
            files = set.files.len(),
            skipped = set.diagnostics.len(),
            "source discovery finished"
        );
        Ok(set)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map_or(false, |name| self.exclude_dirs.contains(name))
    }

    fn is_excluded_file(&self, relative: &str) -> bool {
        self.exclude.iter().any(|pattern| pattern.matches(relative))
    }
}

/// `/`-separated path of `path` below `root`. A file root yields its file name.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path.file_name().map(Path::new).unwrap_or(path),
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_text(path: &Path) -> std::result::Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())
}
