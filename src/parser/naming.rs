// Canonical module names derived from relative file paths

/// Derives module names from `/`-separated relative paths
#[derive(Debug, Clone, Default)]
pub struct ModuleNamer {
    /// Leading components stripped from paths, e.g. `src` or `lib/python`
    source_roots: Vec<Vec<String>>,
}

impl ModuleNamer {
    /// Create a namer that strips the given source roots
    pub fn new(source_roots: &[String]) -> Self {
        let source_roots = source_roots
            .iter()
            .map(|root| split_components(root).map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty())
            .collect();
        Self { source_roots }
    }

    /// Convert a relative file path to a module name.
    ///
    /// The first matching source root is stripped, the extension removed,
    /// a trailing package marker collapsed into its directory, and the
    /// remaining components joined with `separator`.
    pub fn module_name(
        &self,
        relative_path: &str,
        separator: char,
        package_marker: Option<&str>,
    ) -> String {
        let mut parts: Vec<&str> = split_components(relative_path).collect();
        if let Some(last) = parts.last_mut() {
            *last = strip_extension(last);
        }
        self.join_components(parts, separator, package_marker)
    }

    /// Name for path components whose extension is already removed
    pub fn join_components(
        &self,
        mut parts: Vec<&str>,
        separator: char,
        package_marker: Option<&str>,
    ) -> String {
        for root in &self.source_roots {
            if parts.len() > root.len() && parts.iter().zip(root).all(|(p, r)| p == r) {
                parts.drain(..root.len());
                break;
            }
        }

        if parts.len() > 1 && package_marker.is_some() && parts.last().copied() == package_marker {
            parts.pop();
        }

        parts.join(&separator.to_string())
    }
}

/// Split a path on `/` and `\`, dropping empty and `.` components
pub(crate) fn split_components(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|c| !c.is_empty() && *c != ".")
}

/// Remove the final extension from a file name, keeping dotfiles intact
pub(crate) fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// The segment of a token before its first `.` or `/`
pub fn root_segment(token: &str) -> &str {
    token.split(['.', '/']).next().unwrap_or(token)
}
