//! Module file discovery
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::path::{Path, PathBuf};

use log::warn;

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &["locales", "translate", "node_modules", "target"];

/// Manifest file extensions.
const MODULE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Enumerate every eligible module manifest under `root`.
///
/// Paths are returned absolute and traversal-safe: each file is resolved
/// and must remain prefixed by the resolved root, so symlinks cannot pull
/// in files from outside the declared tree. Ordering follows directory
/// iteration and carries no guarantee.
pub fn discover_modules(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let root = root.canonicalize()?;
    let mut files = Vec::new();
    walk(&root, &root, &mut files)?;
    Ok(files)
}

fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if path.is_dir() {
            if name.starts_with('.') || IGNORED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk(&path, root, out)?;
            continue;
        }

        if !has_module_extension(&path) || is_ignored_file(&name) {
            continue;
        }

        // Resolve symlinks before the traversal check.
        let resolved = match path.canonicalize() {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Skipping unresolvable module path {}: {e}", path.display());
                continue;
            }
        };
        if !is_safe_path(&resolved, root) {
            warn!(
                "Skipping module outside the declared root: {}",
                path.display()
            );
            continue;
        }

        out.push(resolved);
    }
    Ok(())
}

fn has_module_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MODULE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Files excluded from loading: test fixtures, configuration, index
/// aggregators, and hidden files.
pub fn is_ignored_file(name: &str) -> bool {
    name.starts_with('.')
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.contains(".config.")
        || name.starts_with("index.")
}

/// A resolved path is safe iff it stays under the resolved root.
pub fn is_safe_path(resolved: &Path, root: &Path) -> bool {
    resolved.starts_with(root)
}
