// ABOUTME: Async CLI invocation for the gcloud and kubectl adapters.
// ABOUTME: Captures stdout, feeds optional stdin, and classifies failures.

use std::ffi::OsString;
use std::process::Stdio;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::error::classify;
use crate::cloud::CloudError;

/// One CLI invocation.
#[derive(Debug, Clone)]
pub(super) struct CliCommand {
    program: String,
    args: Vec<String>,
    env: Vec<(String, OsString)>,
    stdin: Option<Bytes>,
}

impl CliCommand {
    pub(super) fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
        }
    }

    pub(super) fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(super) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub(super) fn env(mut self, key: &str, value: impl Into<OsString>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    pub(super) fn stdin(mut self, data: Bytes) -> Self {
        self.stdin = Some(data);
        self
    }

    /// Run to completion and return stdout.
    pub(super) async fn output(&self) -> Result<String, CloudError> {
        debug!(program = %self.program, args = ?self.args, "running command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CloudError::Permanent(format!("failed to run {}: {e}", self.program)))?;

        if let (Some(data), Some(mut stdin)) = (&self.stdin, child.stdin.take()) {
            stdin.write_all(data).await.map_err(|e| {
                CloudError::Transient(format!("failed to write to {}: {e}", self.program))
            })?;
            // Closing stdin signals end of input.
            drop(stdin);
        }

        let output = child.wait_with_output().await.map_err(|e| {
            CloudError::Transient(format!("failed to wait for {}: {e}", self.program))
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(program = %self.program, code = ?output.status.code(), %stderr, "command failed");
            Err(classify(&stderr))
        }
    }

    /// Run and parse stdout as JSON.
    pub(super) async fn json<T: DeserializeOwned>(&self) -> Result<T, CloudError> {
        let stdout = self.output().await?;
        serde_json::from_str(&stdout).map_err(|e| {
            CloudError::Permanent(format!("unexpected output from {}: {e}", self.program))
        })
    }
}
