// ABOUTME: Config values that may come from environment variables.
// ABOUTME: Lets project, region, and cluster follow the shell's gcloud context.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// A literal string or a reference to an environment variable.
///
/// ```yaml
/// project: my-project
/// region: { env: HOIST_REGION, default: us-central1 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        EnvValue::Literal(value.into())
    }

    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) if !val.is_empty() => Ok(val),
                _ => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(s) => f.write_str(s),
            EnvValue::FromEnv { var, default: None } => write!(f, "{{ env: {var} }}"),
            EnvValue::FromEnv {
                var,
                default: Some(default),
            } => write!(f, "{{ env: {var}, default: {default} }}"),
        }
    }
}
