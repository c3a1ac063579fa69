// ABOUTME: Terminal rendering of progress events for the CLI.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use super::{ProgressEvent, ProgressSink, Severity};
use crate::deploy::DeploymentResult;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (errors and the final result only)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Prints progress events and the final outcome.
pub struct ConsoleSink {
    mode: OutputMode,
    started: Instant,
}

impl ConsoleSink {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Print the deployed endpoint.
    pub fn success(&self, result: &DeploymentResult) {
        match self.mode {
            OutputMode::Normal => {
                println!(
                    "Deployed {} at {} ({:.1}s)",
                    result.service_name,
                    result.url,
                    self.elapsed_secs()
                );
            }
            OutputMode::Quiet => println!("{}", result.url),
            OutputMode::Json => {
                let line = JsonResult {
                    event: "success",
                    service: result.service_name.as_str(),
                    url: &result.url,
                    duration_secs: self.elapsed_secs(),
                };
                if let Ok(json) = serde_json::to_string(&line) {
                    println!("{json}");
                }
            }
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn on_event(&self, event: &ProgressEvent) {
        match (self.mode, event.severity) {
            (OutputMode::Json, _) => {
                if let Ok(json) = serde_json::to_string(event) {
                    println!("{json}");
                }
            }
            (_, Severity::Debug) => {}
            (OutputMode::Normal, Severity::Info) => println!("  → {}", event.message),
            (OutputMode::Normal, Severity::Warn) => eprintln!("  ! {}", event.message),
            (_, Severity::Error) => eprintln!("  ✗ {}", event.message),
            (OutputMode::Quiet, _) => {}
        }
    }
}

#[derive(Serialize)]
struct JsonResult<'a> {
    event: &'a str,
    service: &'a str,
    url: &'a str,
    duration_secs: f64,
}
