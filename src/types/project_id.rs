// ABOUTME: Cloud project identifier validation.
// ABOUTME: Enforces the 6-30 character lowercase project id format.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectIdError {
    #[error("project id cannot be empty")]
    Empty,

    #[error("project id must be between 6 and 30 characters, got {0}")]
    BadLength(usize),

    #[error("project id must start with a lowercase letter")]
    BadStart,

    #[error("project id cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in project id: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(value: &str) -> Result<Self, ProjectIdError> {
        let Some(first) = value.chars().next() else {
            return Err(ProjectIdError::Empty);
        };

        if !(6..=30).contains(&value.len()) {
            return Err(ProjectIdError::BadLength(value.len()));
        }

        if !first.is_ascii_lowercase() {
            return Err(ProjectIdError::BadStart);
        }

        if value.ends_with('-') {
            return Err(ProjectIdError::EndsWithHyphen);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(ProjectIdError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
