// Python front end using tree-sitter

use crate::error::Result;
use crate::parser::naming::root_segment;
use crate::parser::{
    check_grammar, node_text, parse_tree, walk_preorder, Language, ModuleInfo, ModuleNamer,
    ModuleReferenceExtractor,
};
use crate::source::SourceFile;
use tree_sitter::{Language as Grammar, Node};

const PACKAGE_MARKER: &str = "__init__";

/// Python 3.10+ standard library, top-level names only
const STDLIB_MODULES: &[&str] = &[
    // Built-in and core
    "abc", "aifc", "argparse", "array", "ast", "asynchat", "asyncio",
    "asyncore", "atexit", "audioop", "base64", "bdb", "binascii",
    "binhex", "bisect", "builtins", "bz2", "calendar", "cgi", "cgitb",
    "chunk", "cmath", "cmd", "code", "codecs", "codeop", "collections",
    "colorsys", "compileall", "concurrent", "configparser", "contextlib",
    "contextvars", "copy", "copyreg", "cProfile", "crypt", "csv",
    "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal",
    "difflib", "dis", "distutils", "doctest", "email", "encodings",
    "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput",
    "fnmatch", "fractions", "ftplib", "functools", "gc", "getopt",
    "getpass", "gettext", "glob", "graphlib", "grp", "gzip", "hashlib",
    "heapq", "hmac", "html", "http", "idlelib", "imaplib", "imghdr",
    "imp", "importlib", "inspect", "io", "ipaddress", "itertools",
    "json", "keyword", "lib2to3", "linecache", "locale", "logging",
    "lzma", "mailbox", "mailcap", "marshal", "math", "mimetypes",
    "mmap", "modulefinder", "multiprocessing", "netrc", "nis",
    "nntplib", "numbers", "operator", "optparse", "os", "ossaudiodev",
    "pathlib", "pdb", "pickle", "pickletools", "pipes", "pkgutil",
    "platform", "plistlib", "poplib", "posix", "posixpath", "pprint",
    "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr",
    "pydoc", "queue", "quopri", "random", "re", "readline", "reprlib",
    "resource", "rlcompleter", "runpy", "sched", "secrets", "select",
    "selectors", "shelve", "shlex", "shutil", "signal", "site",
    "smtpd", "smtplib", "sndhdr", "socket", "socketserver", "spwd",
    "sqlite3", "ssl", "stat", "statistics", "string", "stringprep",
    "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig",
    "syslog", "tabnanny", "tarfile", "telnetlib", "tempfile", "termios",
    "test", "textwrap", "threading", "time", "timeit", "tkinter",
    "token", "tokenize", "tomllib", "trace", "traceback", "tracemalloc",
    "tty", "turtle", "turtledemo", "types", "typing", "unicodedata",
    "unittest", "urllib", "uu", "uuid", "venv", "warnings", "wave",
    "weakref", "webbrowser", "winreg", "winsound", "wsgiref", "xdrlib",
    "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib",
    // Common typing extensions
    "typing_extensions",
    // Underscore modules
    "_thread", "__future__",
];

/// Extractor for Python source files
pub struct PythonExtractor {
    grammar: Grammar,
}

impl PythonExtractor {
    /// Create a new Python extractor
    pub fn new() -> Result<Self> {
        let grammar = tree_sitter_python::language();
        check_grammar(&grammar, "Python")?;
        Ok(Self { grammar })
    }
}

impl ModuleReferenceExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn separator(&self) -> char {
        '.'
    }

    fn package_marker(&self) -> Option<&'static str> {
        Some(PACKAGE_MARKER)
    }

    fn platform_modules(&self) -> &'static [&'static str] {
        STDLIB_MODULES
    }

    fn extract(&self, file: &SourceFile, namer: &ModuleNamer) -> Result<ModuleInfo> {
        let tree = parse_tree(&self.grammar, &file.text, &file.relative_path)?;
        let root = tree.root_node();
        let source = file.text.as_bytes();

        let module_name = self.module_name(&file.relative_path, namer);
        let mut info = ModuleInfo::new(&file.relative_path, &module_name, Language::Python);
        let package = package_parts(&module_name, is_package_file(&file.relative_path));

        walk_preorder(root, |node| match node.kind() {
            "import_statement" => {
                info.add_import(node_text(node, source));
                collect_import(node, source, &mut info);
                false
            }
            "import_from_statement" => {
                info.add_import(node_text(node, source));
                collect_import_from(node, source, &package, &mut info);
                false
            }
            "future_import_statement" => {
                info.add_import(node_text(node, source));
                info.add_dependency("__future__");
                false
            }
            _ => true,
        });

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if let Some(name) = declaration_name(child, source) {
                info.add_declaration(name);
            }
        }

        Ok(info)
    }
}

fn is_package_file(relative_path: &str) -> bool {
    relative_path
        .rsplit(['/', '\\'])
        .next()
        .map_or(false, |name| name == "__init__.py")
}

/// Dotted components of the package that contains a module
fn package_parts(module_name: &str, is_package: bool) -> Vec<String> {
    if module_name == PACKAGE_MARKER {
        return Vec::new();
    }
    let mut parts: Vec<String> = module_name.split('.').map(str::to_string).collect();
    if !is_package {
        parts.pop();
    }
    parts
}

/// Dotted names listed by an import, without their aliases
fn imported_names<'s>(node: Node<'_>, source: &'s [u8]) -> Vec<&'s str> {
    let mut cursor = node.walk();
    let names: Vec<&str> = node
        .children_by_field_name("name", &mut cursor)
        .map(|name| match name.kind() {
            "aliased_import" => name
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or(""),
            _ => node_text(name, source),
        })
        .filter(|name| !name.is_empty())
        .collect();
    names
}

/// `import a.b, c as d`: one token per imported name
fn collect_import(node: Node<'_>, source: &[u8], info: &mut ModuleInfo) {
    for dotted in imported_names(node, source) {
        info.add_dependency(root_segment(dotted));
    }
}

/// `from a.b import c` or `from ..x import y`
fn collect_import_from(node: Node<'_>, source: &[u8], package: &[String], info: &mut ModuleInfo) {
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };

    if module.kind() != "relative_import" {
        let dotted = node_text(module, source);
        if !dotted.is_empty() {
            info.add_dependency(root_segment(dotted));
        }
        return;
    }

    let mut level = 0;
    let mut target = None;
    let mut cursor = module.walk();
    for child in module.children(&mut cursor) {
        match child.kind() {
            "import_prefix" => {
                level = node_text(child, source).chars().filter(|c| *c == '.').count();
            }
            "dotted_name" => target = Some(node_text(child, source)),
            _ => {}
        }
    }

    match resolve_relative(package, level, target) {
        Some(resolved) if resolved.is_empty() => {
            // `from . import b` at the top of the tree names sibling modules
            for name in imported_names(node, source) {
                info.add_dependency(root_segment(name));
            }
        }
        Some(resolved) => {
            info.add_dependency(&resolved);
            // Each imported name may be a submodule of the resolved package
            for name in imported_names(node, source) {
                info.add_dependency(&format!("{}.{}", resolved, name));
            }
        }
        None => {}
    }
}

/// Resolve a relative import against a package path.
///
/// Returns `None` when the import climbs above the analysis root.
fn resolve_relative(package: &[String], level: usize, target: Option<&str>) -> Option<String> {
    let up = level.saturating_sub(1);
    if up > package.len() {
        return None;
    }
    let mut parts: Vec<&str> = package[..package.len() - up]
        .iter()
        .map(String::as_str)
        .collect();
    if let Some(target) = target {
        parts.extend(target.split('.').filter(|p| !p.is_empty()));
    }
    Some(parts.join("."))
}

/// Name of a top-level class or function definition
fn declaration_name<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    match node.kind() {
        "class_definition" | "function_definition" => node
            .child_by_field_name("name")
            .map(|n| node_text(n, source)),
        "decorated_definition" => node
            .child_by_field_name("definition")
            .and_then(|def| declaration_name(def, source)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn extract_at(path: &str, source: &str) -> ModuleInfo {
        let extractor = PythonExtractor::new().unwrap();
        let file = SourceFile::new(path, source);
        extractor.extract(&file, &ModuleNamer::default()).unwrap()
    }

    fn extract(source: &str) -> ModuleInfo {
        extract_at("pkg/sub/mod.py", source)
    }

    #[test]
    fn test_extractor_new() {
        let extractor = PythonExtractor::new();
        assert!(extractor.is_ok());
    }

    #[test]
    fn test_empty_file() {
        let info = extract("");
        assert!(info.is_empty());
        assert_eq!(info.complexity_score, 0);
    }

    #[test]
    fn test_simple_import() {
        let info = extract("import os.path\n");
        assert_eq!(info.imports, vec!["import os.path"]);
        assert!(info.dependencies.contains("os"));
    }

    #[test]
    fn test_multi_name_import() {
        let info = extract("import numpy as np, requests, app.models\n");
        let deps: Vec<_> = info.dependencies.iter().cloned().collect();
        assert_eq!(deps, vec!["app", "numpy", "requests"]);
        assert_eq!(info.imports.len(), 1);
    }

    #[test]
    fn test_from_import_takes_leftmost_segment() {
        let info = extract("from app.core.models import User, Group\n");
        assert_eq!(info.dependencies.len(), 1);
        assert!(info.dependencies.contains("app"));
    }

    #[test]
    fn test_relative_import_same_package() {
        let info = extract("from .helpers import fmt\n");
        assert!(info.dependencies.contains("pkg.sub.helpers"));
    }

    #[test]
    fn test_relative_import_parent_package() {
        let info = extract("from .. import config\n");
        let deps: Vec<_> = info.dependencies.iter().cloned().collect();
        assert_eq!(deps, vec!["pkg", "pkg.config"]);
    }

    #[test]
    fn test_relative_import_names_sibling_submodules() {
        let info = extract_at("pkg/a.py", "from . import b, c as d\n");
        let deps: Vec<_> = info.dependencies.iter().cloned().collect();
        assert_eq!(deps, vec!["pkg", "pkg.b", "pkg.c"]);
    }

    #[test]
    fn test_relative_import_from_package_init() {
        let info = extract_at("pkg/__init__.py", "from .core import run\nfrom . import x\n");
        assert!(info.dependencies.contains("pkg.core"));
        assert!(info.dependencies.contains("pkg.x"));
        // The package never depends on itself
        assert!(!info.dependencies.contains("pkg"));
    }

    #[test]
    fn test_module_named_under_source_root() {
        let extractor = PythonExtractor::new().unwrap();
        let namer = ModuleNamer::new(&["src".to_string()]);
        let file = SourceFile::new("src/shop/api.py", "from . import services\n");
        let info = extractor.extract(&file, &namer).unwrap();
        assert_eq!(info.module_name, "shop.api");
        assert!(info.dependencies.contains("shop.services"));
    }

    #[test]
    fn test_relative_import_at_top_level() {
        let info = extract_at("a.py", "from . import b, c as d\n");
        assert!(info.dependencies.contains("b"));
        assert!(info.dependencies.contains("c"));
    }

    #[test]
    fn test_relative_import_above_root() {
        let info = extract_at("a.py", "from ... import nothing\n");
        assert_eq!(info.imports.len(), 1);
        assert!(info.dependencies.is_empty());
    }

    #[test]
    fn test_nested_imports_collected() {
        let source = "\
try:
    import ujson as json
except ImportError:
    import json

def load():
    import yaml
    return yaml
";
        let info = extract(source);
        assert_eq!(info.imports.len(), 3);
        assert!(info.dependencies.contains("ujson"));
        assert!(info.dependencies.contains("json"));
        assert!(info.dependencies.contains("yaml"));
    }

    #[test]
    fn test_future_import() {
        let info = extract("from __future__ import annotations\n");
        assert!(info.dependencies.contains("__future__"));
    }

    #[test]
    fn test_top_level_declarations() {
        let source = "\
import functools

class Loader:
    def method(self):
        pass

def helper():
    def inner():
        pass

async def fetch():
    pass

@functools.cache
def cached():
    pass

@dataclass
class Point:
    x: int
";
        let info = extract(source);
        let names: Vec<_> = info.exports.iter().cloned().collect();
        assert_eq!(names, vec!["Loader", "Point", "cached", "fetch", "helper"]);
        assert_eq!(info.complexity_score, 5);
    }

    #[test]
    fn test_self_import_dropped() {
        let info = extract_at("utils.py", "import utils\n");
        assert!(info.dependencies.is_empty());
        assert_eq!(info.imports.len(), 1);
    }

    #[test]
    fn test_syntax_error() {
        let extractor = PythonExtractor::new().unwrap();
        let file = SourceFile::new("broken.py", "def broken(:\n    pass\n");
        let err = extractor.extract(&file, &ModuleNamer::default()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.path(), Some("broken.py"));
    }

    #[test]
    fn test_package_parts() {
        assert_eq!(package_parts("pkg.sub.mod", false), vec!["pkg", "sub"]);
        assert_eq!(package_parts("pkg.sub", true), vec!["pkg", "sub"]);
        assert!(package_parts("mod", false).is_empty());
        assert!(package_parts("__init__", true).is_empty());
    }

    #[test]
    fn test_resolve_relative() {
        let package = vec!["a".to_string(), "b".to_string()];
        assert_eq!(resolve_relative(&package, 1, Some("c")), Some("a.b.c".to_string()));
        assert_eq!(resolve_relative(&package, 2, None), Some("a".to_string()));
        assert_eq!(resolve_relative(&package, 3, Some("x.y")), Some("x.y".to_string()));
        assert_eq!(resolve_relative(&package, 4, None), None);
    }

    #[test]
    fn test_stdlib_list() {
        let extractor = PythonExtractor::new().unwrap();
        let platform = extractor.platform_modules();
        assert!(platform.contains(&"os"));
        assert!(platform.contains(&"typing"));
        assert!(!platform.contains(&"django"));
    }
}
