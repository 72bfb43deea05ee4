// Per-file structural record produced by the extractors
//
// These records are the only thing the graph builder sees; parser
// internals never leak past this type.

use crate::parser::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structural summary of one source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleInfo {
    /// Path relative to the analysis root, `/`-separated
    pub file_path: String,
    /// Canonical module name, unique within a run
    pub module_name: String,
    /// Front end that produced this record
    pub language: Language,
    /// Raw import statements in source order
    pub imports: Vec<String>,
    /// Top-level class and function names
    pub exports: BTreeSet<String>,
    /// Module tokens referenced by imports, before resolution
    pub dependencies: BTreeSet<String>,
    /// Modules that depend on this one (filled in by the graph builder)
    pub dependents: BTreeSet<String>,
    /// Number of top-level class and function declarations
    pub complexity_score: usize,
}

impl ModuleInfo {
    /// Create an empty record for a file
    pub fn new(file_path: &str, module_name: &str, language: Language) -> Self {
        Self {
            file_path: file_path.to_string(),
            module_name: module_name.to_string(),
            language,
            imports: Vec::new(),
            exports: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
            complexity_score: 0,
        }
    }

    /// Record a raw import statement
    pub fn add_import(&mut self, statement: &str) {
        self.imports.push(statement.trim().to_string());
    }

    /// Record a referenced module token. Self references are dropped.
    pub fn add_dependency(&mut self, token: &str) {
        if !token.is_empty() && token != self.module_name {
            self.dependencies.insert(token.to_string());
        }
    }

    /// Record a top-level class or function declaration
    pub fn add_declaration(&mut self, name: &str) {
        self.exports.insert(name.to_string());
        self.complexity_score += 1;
    }

    /// Check if file declares nothing and imports nothing
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.exports.is_empty()
    }
}
