// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path containment for sandboxed filesystem operations.

use std::path::{Component, Path, PathBuf};

/// Resolves a requested path against the sandbox root and rejects anything
/// that escapes it. Normalization is lexical (`.` and `..` are folded
/// without touching the filesystem), so the check also holds for paths
/// that do not exist yet. The root must already be canonicalized.
pub fn resolve_contained(root: &Path, requested: &str) -> Result<PathBuf, String> {
    let requested_path = Path::new(requested);
    let absolute = if requested_path.is_absolute() {
        requested_path.to_path_buf()
    } else {
        root.join(requested_path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(format!("outside sandbox root: {requested}"));
                }
            }
            other => normalized.push(other),
        }
    }

    if normalized.starts_with(root) {
        Ok(normalized)
    } else {
        Err(format!("outside sandbox root: {requested}"))
    }
}

/// Renders a contained path relative to the root, for output.
pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|rel| rel.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/work")
    }

    #[test]
    fn relative_paths_resolve_under_root() {
        let resolved = resolve_contained(&root(), "sub/file.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/sub/file.txt"));
    }

    #[test]
    fn absolute_paths_inside_root_are_accepted() {
        let resolved = resolve_contained(&root(), "/work/sub/file.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/sub/file.txt"));
    }

    #[test]
    fn parent_traversal_out_of_root_is_rejected() {
        let err = resolve_contained(&root(), "/work/../etc/passwd").unwrap_err();
        assert!(err.contains("outside sandbox root"));

        let err = resolve_contained(&root(), "../etc/passwd").unwrap_err();
        assert!(err.contains("outside sandbox root"));
    }

    #[test]
    fn traversal_that_returns_inside_is_accepted() {
        let resolved = resolve_contained(&root(), "sub/../other.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/other.txt"));
    }

    #[test]
    fn unrelated_absolute_paths_are_rejected() {
        let err = resolve_contained(&root(), "/etc/passwd").unwrap_err();
        assert!(err.contains("outside sandbox root"));
    }

    #[test]
    fn dot_components_are_folded() {
        let resolved = resolve_contained(&root(), "./sub/./file.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/sub/file.txt"));
    }

    #[test]
    fn relative_display_strips_root() {
        assert_eq!(
            relative_display(&root(), Path::new("/work/sub/file.txt")),
            "sub/file.txt"
        );
    }
}
