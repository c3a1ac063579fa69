// ABOUTME: Library root for hoist - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod apply;
pub mod build;
pub mod cloud;
pub mod config;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod package;
pub mod poll;
pub mod progress;
pub mod provision;
pub mod types;
