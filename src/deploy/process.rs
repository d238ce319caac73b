// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Subprocess invocation of the `terraform` CLI.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("terraform {command} timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("failed to spawn terraform {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("terraform {command} exited with status {code}: {stderr}")]
    NonZeroExit { command: String, code: i32, stderr: String },
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `terraform <args>` in `working_dir` with `env_vars` injected into
/// the child process's environment only — never written to disk.
pub async fn run_terraform(
    working_dir: &Path,
    args: &[&str],
    env_vars: &[(String, String)],
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let command_label = args.join(" ");

    let mut command = Command::new("terraform");
    command.args(args).current_dir(working_dir).kill_on_drop(true);
    for (key, value) in env_vars {
        command.env(key, value);
    }

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ProcessError::Timeout {
            command: command_label.clone(),
            timeout_secs: timeout.as_secs(),
        })?
        .map_err(|source| ProcessError::Spawn {
            command: command_label.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(ProcessError::NonZeroExit {
            command: command_label,
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}
