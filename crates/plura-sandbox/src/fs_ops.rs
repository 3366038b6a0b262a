// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contained filesystem operations: list, read, write, targeted replace,
//! glob, and regex search. Every operation resolves its target through the
//! containment check before any I/O.

use std::path::Path;

use globset::Glob;
use regex::Regex;

use crate::contain::{relative_display, resolve_contained};

pub async fn list_dir(root: &Path, args: &serde_json::Value) -> Result<String, String> {
    let requested = args["path"].as_str().unwrap_or(".");
    let path = resolve_contained(root, requested)?;

    let mut reader = tokio::fs::read_dir(&path)
        .await
        .map_err(|e| format!("failed to list '{requested}': {e}"))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| format!("failed to list '{requested}': {e}"))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push(if is_dir { format!("{name}/") } else { name });
    }
    entries.sort();

    if entries.is_empty() {
        Ok(format!("'{requested}' is empty"))
    } else {
        Ok(entries.join("\n"))
    }
}

pub async fn read_file(root: &Path, args: &serde_json::Value) -> Result<String, String> {
    let requested = args["path"]
        .as_str()
        .ok_or("missing required 'path' parameter")?;
    let path = resolve_contained(root, requested)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("failed to read '{requested}': {e}"))?;
    let size = bytes.len();

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(_) => Ok(format!("binary file ({size} bytes)")),
    }
}

pub async fn write_file(root: &Path, args: &serde_json::Value) -> Result<String, String> {
    let requested = args["path"]
        .as_str()
        .ok_or("missing required 'path' parameter")?;
    let content = args["content"]
        .as_str()
        .ok_or("missing required 'content' parameter")?;
    let path = resolve_contained(root, requested)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("failed to create parent directories: {e}"))?;
    }
    tokio::fs::write(&path, content)
        .await
        .map_err(|e| format!("failed to write '{requested}': {e}"))?;

    Ok(format!(
        "wrote {} bytes to '{}'",
        content.len(),
        relative_display(root, &path)
    ))
}

/// Replaces every occurrence of an exact substring. When the caller
/// supplies `expected_replacements` and the actual count differs, nothing
/// is written.
pub async fn replace_in_file(root: &Path, args: &serde_json::Value) -> Result<String, String> {
    let requested = args["path"]
        .as_str()
        .ok_or("missing required 'path' parameter")?;
    let old = args["old"]
        .as_str()
        .ok_or("missing required 'old' parameter")?;
    let new = args["new"]
        .as_str()
        .ok_or("missing required 'new' parameter")?;
    if old.is_empty() {
        return Err("'old' must not be empty".to_string());
    }
    let path = resolve_contained(root, requested)?;

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| format!("failed to read '{requested}': {e}"))?;

    let count = contents.matches(old).count();
    if count == 0 {
        return Err(format!("no occurrences of '{old}' in '{requested}'"));
    }
    if let Some(expected) = args["expected_replacements"].as_u64() {
        if count as u64 != expected {
            return Err(format!(
                "expected {expected} occurrences of '{old}' but found {count}; file left unchanged"
            ));
        }
    }

    let replaced = contents.replace(old, new);
    tokio::fs::write(&path, replaced)
        .await
        .map_err(|e| format!("failed to write '{requested}': {e}"))?;

    Ok(format!(
        "replaced {count} occurrence(s) in '{}'",
        relative_display(root, &path)
    ))
}

pub fn glob(root: &Path, args: &serde_json::Value) -> Result<String, String> {
    let pattern = args["pattern"]
        .as_str()
        .ok_or("missing required 'pattern' parameter")?;
    let matcher = Glob::new(pattern)
        .map_err(|e| format!("invalid glob pattern '{pattern}': {e}"))?
        .compile_matcher();

    let mut matches = Vec::new();
    for file in walk_files(root) {
        let rel = relative_display(root, &file);
        if matcher.is_match(&rel) {
            matches.push(rel);
        }
    }
    matches.sort();

    if matches.is_empty() {
        Ok(format!("no matches for '{pattern}'"))
    } else {
        Ok(matches.join("\n"))
    }
}

/// Regex search over text files under the root. Unreadable and non-text
/// files are skipped without failing the search.
pub fn search(root: &Path, args: &serde_json::Value) -> Result<String, String> {
    let pattern = args["pattern"]
        .as_str()
        .ok_or("missing required 'pattern' parameter")?;
    let regex = Regex::new(pattern).map_err(|e| format!("invalid regex '{pattern}': {e}"))?;

    let base = match args["path"].as_str() {
        Some(requested) => resolve_contained(root, requested)?,
        None => root.to_path_buf(),
    };

    let mut lines = Vec::new();
    for file in walk_files(&base) {
        let Ok(contents) = std::fs::read_to_string(&file) else {
            continue;
        };
        let rel = relative_display(root, &file);
        for (number, line) in contents.lines().enumerate() {
            if regex.is_match(line) {
                lines.push(format!("{rel}:{}:{line}", number + 1));
            }
        }
    }

    if lines.is_empty() {
        Ok(format!("no matches for '{pattern}'"))
    } else {
        Ok(lines.join("\n"))
    }
}

/// Collects every file under `base`, depth-first. Unreadable directories
/// are skipped.
fn walk_files(base: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![base.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(reader) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in reader.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files
}
