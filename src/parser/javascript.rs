// JavaScript/TypeScript front end using tree-sitter

use crate::error::Result;
use crate::parser::naming::split_components;
use crate::parser::{
    check_grammar, node_text, parse_tree, walk_preorder, Language, ModuleInfo, ModuleNamer,
    ModuleReferenceExtractor,
};
use crate::source::SourceFile;
use tree_sitter::{Language as Grammar, Node};

const PACKAGE_MARKER: &str = "index";

const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];
const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Extensions a relative specifier may carry that name a script module
const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Non-script assets pulled in through bundler imports
const ASSET_EXTENSIONS: &[&str] = &[
    "css", "scss", "sass", "less", "styl", "json", "svg", "png", "jpg", "jpeg", "gif", "webp",
    "ico", "woff", "woff2", "ttf", "eot", "html", "md", "txt", "wasm",
];

/// Node.js core modules
const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console",
    "constants", "crypto", "dgram", "diagnostics_channel", "dns", "domain",
    "events", "fs", "http", "http2", "https", "inspector", "module", "net",
    "os", "path", "perf_hooks", "process", "punycode", "querystring",
    "readline", "repl", "stream", "string_decoder", "sys", "test", "timers",
    "tls", "trace_events", "tty", "url", "util", "v8", "vm", "wasi",
    "worker_threads", "zlib",
];

/// Extractor for JavaScript or TypeScript source files
pub struct JavaScriptExtractor {
    language: Language,
    grammar: Grammar,
    /// Grammar for `.tsx` files, TypeScript only
    tsx_grammar: Option<Grammar>,
}

impl JavaScriptExtractor {
    /// Create an extractor for `.js`, `.jsx`, `.mjs` and `.cjs` files
    pub fn javascript() -> Result<Self> {
        let grammar = tree_sitter_javascript::language();
        check_grammar(&grammar, "JavaScript")?;
        Ok(Self {
            language: Language::JavaScript,
            grammar,
            tsx_grammar: None,
        })
    }

    /// Create an extractor for `.ts`, `.tsx`, `.mts` and `.cts` files
    pub fn typescript() -> Result<Self> {
        let grammar = tree_sitter_typescript::language_typescript();
        check_grammar(&grammar, "TypeScript")?;
        let tsx = tree_sitter_typescript::language_tsx();
        check_grammar(&tsx, "TSX")?;
        Ok(Self {
            language: Language::TypeScript,
            grammar,
            tsx_grammar: Some(tsx),
        })
    }

    fn grammar_for(&self, path: &str) -> &Grammar {
        match &self.tsx_grammar {
            Some(tsx) if path.ends_with(".tsx") => tsx,
            _ => &self.grammar,
        }
    }
}

impl ModuleReferenceExtractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        self.language
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self.language {
            Language::TypeScript => TS_EXTENSIONS,
            _ => JS_EXTENSIONS,
        }
    }

    fn separator(&self) -> char {
        '/'
    }

    fn package_marker(&self) -> Option<&'static str> {
        Some(PACKAGE_MARKER)
    }

    fn platform_modules(&self) -> &'static [&'static str] {
        NODE_BUILTINS
    }

    fn extract(&self, file: &SourceFile, namer: &ModuleNamer) -> Result<ModuleInfo> {
        let grammar = self.grammar_for(&file.relative_path);
        let tree = parse_tree(grammar, &file.text, &file.relative_path)?;
        let root = tree.root_node();
        let source = file.text.as_bytes();

        let module_name = self.module_name(&file.relative_path, namer);
        let mut info = ModuleInfo::new(&file.relative_path, &module_name, self.language);
        let base = directory_of(&file.relative_path);

        walk_preorder(root, |node| {
            let (statement, specifier, descend) = match node.kind() {
                "import_statement" => (node, import_source(node, source), false),
                "export_statement" => match node.child_by_field_name("source") {
                    Some(src) => (node, Some(string_value(src, source)), false),
                    None => return true,
                },
                "call_expression" => match call_specifier(node, source) {
                    Some(found) => (node, Some(found), true),
                    None => return true,
                },
                _ => return true,
            };

            info.add_import(node_text(statement, source));
            if let Some(token) = specifier.and_then(|s| specifier_token(s, &base, namer)) {
                info.add_dependency(&token);
            }
            descend
        });

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            collect_declarations(child, source, &mut info);
        }

        Ok(info)
    }
}

/// Directory of a file, as components relative to the analysis root
fn directory_of(relative_path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = split_components(relative_path).collect();
    parts.pop();
    parts
}

/// Source string of `import ... from "x"` or TS `import x = require("x")`
fn import_source<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    if let Some(src) = node.child_by_field_name("source") {
        return Some(string_value(src, source));
    }
    let mut cursor = node.walk();
    let clause = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "import_require_clause")?;
    clause
        .child_by_field_name("source")
        .map(|src| string_value(src, source))
}

/// Specifier of `require("x")` or dynamic `import("x")` with a literal argument
fn call_specifier<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    let function = node.child_by_field_name("function")?;
    let is_loader = match function.kind() {
        "import" => true,
        "identifier" => node_text(function, source) == "require",
        _ => false,
    };
    if !is_loader {
        return None;
    }

    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    match first.kind() {
        "string" => Some(string_value(first, source)),
        "template_string" if first.named_child_count() == 0 => Some(string_value(first, source)),
        _ => None,
    }
}

fn string_value<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node_text(node, source).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Map an import specifier to a module token.
///
/// Bare specifiers become their package root. Relative ones resolve against
/// the importing file's directory `base` and are named by `namer`; they yield
/// `None` when they leave the analysis root or name an asset.
fn specifier_token(specifier: &str, base: &[&str], namer: &ModuleNamer) -> Option<String> {
    let specifier = specifier.trim();
    if specifier.is_empty() || specifier.starts_with('/') {
        return None;
    }
    if specifier.starts_with('.') {
        let parts = resolve_relative(specifier, base)?;
        return Some(namer.join_components(parts, '/', Some(PACKAGE_MARKER)));
    }

    let bare = specifier.strip_prefix("node:").unwrap_or(specifier);
    let mut segments = bare.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    if first.starts_with('@') {
        let name = segments.next()?;
        Some(format!("{}/{}", first, name))
    } else {
        Some(first.to_string())
    }
}

/// Path components of a relative specifier's target, script extension removed
fn resolve_relative<'a>(specifier: &'a str, base: &[&'a str]) -> Option<Vec<&'a str>> {
    let mut parts: Vec<&str> = base.to_vec();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    let last = parts.pop()?;
    match last.rfind('.') {
        Some(idx) if idx > 0 => {
            let extension = &last[idx + 1..];
            if SCRIPT_EXTENSIONS.contains(&extension) {
                parts.push(&last[..idx]);
            } else if ASSET_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
                return None;
            } else {
                parts.push(last);
            }
        }
        _ => parts.push(last),
    }
    Some(parts)
}

/// Record class and function declarations at the top level
fn collect_declarations(node: Node<'_>, source: &[u8], info: &mut ModuleInfo) {
    match node.kind() {
        "class_declaration"
        | "abstract_class_declaration"
        | "function_declaration"
        | "generator_function_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                info.add_declaration(node_text(name, source));
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let (Some(name), Some(value)) = (
                    declarator.child_by_field_name("name"),
                    declarator.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let is_callable = matches!(
                    value.kind(),
                    "arrow_function"
                        | "function"
                        | "function_expression"
                        | "generator_function"
                        | "class"
                );
                if is_callable && name.kind() == "identifier" {
                    info.add_declaration(node_text(name, source));
                }
            }
        }
        "export_statement" => {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                collect_declarations(declaration, source, info);
            } else if let Some(value) = node.child_by_field_name("value") {
                // `export default function name() {}` parsed as an expression
                let named = matches!(
                    value.kind(),
                    "function" | "function_expression" | "generator_function" | "class"
                );
                if let Some(name) = value.child_by_field_name("name").filter(|_| named) {
                    info.add_declaration(node_text(name, source));
                }
            }
        }
        _ => {}
    }
}
