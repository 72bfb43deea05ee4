// Language front ends that turn source text into ModuleInfo records

mod javascript;
mod module_info;
mod naming;
mod python;

pub use javascript::JavaScriptExtractor;
pub use module_info::ModuleInfo;
pub use naming::{root_segment, ModuleNamer};
pub use python::PythonExtractor;

use crate::error::{Error, Result};
use crate::source::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tree_sitter::{Language as Grammar, Node, Parser, Tree};

/// Source languages with a registered front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A language front end: maps one source file to a `ModuleInfo`.
///
/// Implementations must be pure with respect to their input so files can be
/// extracted in parallel.
pub trait ModuleReferenceExtractor: Send + Sync {
    /// Language this extractor produces records for
    fn language(&self) -> Language;

    /// File extensions handled, without the leading dot
    fn extensions(&self) -> &'static [&'static str];

    /// Separator used when joining module name components
    fn separator(&self) -> char;

    /// File stem that names its containing directory, if any
    fn package_marker(&self) -> Option<&'static str> {
        None
    }

    /// Built-in runtime modules that carry no architectural signal
    fn platform_modules(&self) -> &'static [&'static str] {
        &[]
    }

    /// Canonical module name of a file under `namer`
    fn module_name(&self, relative_path: &str, namer: &ModuleNamer) -> String {
        namer.module_name(relative_path, self.separator(), self.package_marker())
    }

    /// Extract structure from one file.
    ///
    /// `namer` names the file itself and any project file it references by path.
    fn extract(&self, file: &SourceFile, namer: &ModuleNamer) -> Result<ModuleInfo>;

    /// Check if this extractor handles a path by extension
    fn handles(&self, path: &str) -> bool {
        extension_of(path).map_or(false, |ext| self.extensions().contains(&ext))
    }
}

/// Extension lookup for the registered front ends
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ModuleReferenceExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one extractor per configured language
    pub fn from_languages(languages: &[Language]) -> Result<Self> {
        let mut registry = Self::new();
        let mut seen = BTreeSet::new();
        for language in languages {
            if !seen.insert(*language) {
                continue;
            }
            let extractor: Box<dyn ModuleReferenceExtractor> = match language {
                Language::Python => Box::new(PythonExtractor::new()?),
                Language::JavaScript => Box::new(JavaScriptExtractor::javascript()?),
                Language::TypeScript => Box::new(JavaScriptExtractor::typescript()?),
            };
            registry.register(extractor);
        }
        Ok(registry)
    }

    /// Add an extractor. Earlier registrations win on shared extensions.
    pub fn register(&mut self, extractor: Box<dyn ModuleReferenceExtractor>) {
        self.extractors.push(extractor);
    }

    /// Find the extractor for a relative path
    pub fn for_path(&self, path: &str) -> Option<&dyn ModuleReferenceExtractor> {
        self.extractors
            .iter()
            .find(|e| e.handles(path))
            .map(|e| e.as_ref())
    }

    /// Check if any registered extractor handles a path
    pub fn handles(&self, path: &str) -> bool {
        self.for_path(path).is_some()
    }

    /// Union of the built-in platform lists
    pub fn platform_modules(&self) -> BTreeSet<String> {
        self.extractors
            .iter()
            .flat_map(|e| e.platform_modules().iter())
            .map(|m| m.to_string())
            .collect()
    }

    pub fn languages(&self) -> Vec<Language> {
        self.extractors.iter().map(|e| e.language()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

/// Extension of a `/`-separated path
fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit(['/', '\\']).next()?;
    let idx = file_name.rfind('.')?;
    if idx == 0 {
        return None;
    }
    Some(&file_name[idx + 1..])
}

/// Check a grammar against the linked tree-sitter runtime
pub(crate) fn check_grammar(grammar: &Grammar, name: &str) -> Result<()> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar)
        .map_err(|e| Error::parser(format!("Failed to set {} language: {}", name, e)))
}

/// Parse source text, rejecting trees that contain syntax errors
pub(crate) fn parse_tree(grammar: &Grammar, source: &str, path: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(grammar)
        .map_err(|e| Error::parser(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::parse(path, "parser produced no tree"))?;

    if let Some(node) = first_error(tree.root_node()) {
        let pos = node.start_position();
        return Err(Error::parse(
            path,
            format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1),
        ));
    }

    Ok(tree)
}

/// First error or missing node in document order
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Pre-order walk. `visit` returns whether to descend into the node.
pub(crate) fn walk_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        let descend = visit(cursor.node());
        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Text of a node, empty if the source slice is not valid UTF-8
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}
