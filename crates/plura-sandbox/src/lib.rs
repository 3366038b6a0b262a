// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool execution sandbox for the Plura unification layer.
//!
//! Executes model-requested tool calls against the local filesystem, a
//! shell, and the web, constrained to a configured root directory. Every
//! failure becomes a structured error outcome; the sandbox never panics
//! on model input.

mod contain;
mod fetch;
mod fs_ops;
mod shell;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use plura_core::{PluraError, ToolCall, ToolOutcome};

pub use contain::resolve_contained;

/// The tool names the sandbox dispatches on, in the order they are
/// advertised to providers.
pub const TOOL_NAMES: &[&str] = &[
    "list_dir",
    "read_file",
    "write_file",
    "replace_in_file",
    "glob",
    "search",
    "shell",
    "web_fetch",
];

/// Executes tool calls under a canonicalized root directory.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    shell_timeout: Duration,
    fetch_max_bytes: usize,
    http: reqwest::Client,
}

impl Sandbox {
    /// Creates a sandbox rooted at `root`, which must exist. The root is
    /// canonicalized once here so containment checks compare against a
    /// stable absolute path.
    pub fn new(
        root: impl AsRef<Path>,
        shell_timeout: Duration,
        fetch_max_bytes: usize,
    ) -> Result<Self, PluraError> {
        let root = root.as_ref().canonicalize().map_err(|e| {
            PluraError::Config(format!(
                "sandbox root '{}' is not usable: {e}",
                root.as_ref().display()
            ))
        })?;
        Ok(Self {
            root,
            shell_timeout,
            fetch_max_bytes,
            http: reqwest::Client::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs one tool call to completion. Failures are returned as error
    /// outcomes carrying the call id, never as process-level errors.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        debug!(tool = %call.name, call_id = %call.id, "executing tool call");
        let args = call.arguments.parse();

        let result = match call.name.as_str() {
            "list_dir" => fs_ops::list_dir(&self.root, &args).await,
            "read_file" => fs_ops::read_file(&self.root, &args).await,
            "write_file" => fs_ops::write_file(&self.root, &args).await,
            "replace_in_file" => fs_ops::replace_in_file(&self.root, &args).await,
            "glob" => fs_ops::glob(&self.root, &args),
            "search" => fs_ops::search(&self.root, &args),
            "shell" => shell::shell(&self.root, self.shell_timeout, &args).await,
            "web_fetch" => fetch::web_fetch(&self.http, self.fetch_max_bytes, &args).await,
            other => Err(format!("unknown tool '{other}'")),
        };

        match result {
            Ok(content) => ToolOutcome::ok(&call.id, content),
            Err(message) => ToolOutcome::error(&call.id, message),
        }
    }
}
