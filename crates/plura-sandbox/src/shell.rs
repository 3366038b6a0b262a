// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shell command execution inside the sandbox root.

use std::path::Path;
use std::time::Duration;

/// Runs a command via `bash -c` with the sandbox root as the working
/// directory and an enforced wall-clock timeout. The command argument must
/// be a JSON string; anything else is refused before spawning.
pub async fn shell(
    root: &Path,
    timeout: Duration,
    args: &serde_json::Value,
) -> Result<String, String> {
    let command = match &args["command"] {
        serde_json::Value::String(s) => s.as_str(),
        serde_json::Value::Null => return Err("missing required 'command' parameter".to_string()),
        other => {
            return Err(format!(
                "'command' must be a string, got {}",
                type_name(other)
            ));
        }
    };

    let run = tokio::process::Command::new("bash")
        .arg("-c")
        .arg(command)
        .current_dir(root)
        .output();

    let output = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| format!("command timed out after {}s", timeout.as_secs()))?
        .map_err(|e| format!("failed to execute command: {e}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if output.status.success() {
        if stderr.is_empty() {
            Ok(stdout.into_owned())
        } else {
            Ok(format!("{stdout}\nstderr:\n{stderr}"))
        }
    } else {
        let exit_code = output.status.code().unwrap_or(-1);
        Err(format!(
            "Exit code: {exit_code}\nstdout:\n{stdout}\nstderr:\n{stderr}"
        ))
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().canonicalize().unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn runs_in_the_sandbox_root() {
        let (_dir, root_path) = root();
        std::fs::write(root_path.join("marker.txt"), "x").unwrap();

        let out = shell(
            &root_path,
            Duration::from_secs(5),
            &json!({"command": "ls"}),
        )
        .await
        .unwrap();
        assert_eq!(out.trim(), "marker.txt");
    }

    #[tokio::test]
    async fn nonzero_exit_reports_code_and_streams() {
        let (_dir, root_path) = root();
        let err = shell(
            &root_path,
            Duration::from_secs(5),
            &json!({"command": "echo out; echo err >&2; exit 3"}),
        )
        .await
        .unwrap_err();
        assert!(err.contains("Exit code: 3"));
        assert!(err.contains("out"));
        assert!(err.contains("err"));
    }

    #[tokio::test]
    async fn non_string_command_is_refused() {
        let (_dir, root_path) = root();
        let err = shell(
            &root_path,
            Duration::from_secs(5),
            &json!({"command": ["ls", "-la"]}),
        )
        .await
        .unwrap_err();
        assert!(err.contains("must be a string"));
    }

    #[tokio::test]
    async fn timeout_is_enforced() {
        let (_dir, root_path) = root();
        let err = shell(
            &root_path,
            Duration::from_millis(100),
            &json!({"command": "sleep 5"}),
        )
        .await
        .unwrap_err();
        assert!(err.contains("timed out"));
    }
}
