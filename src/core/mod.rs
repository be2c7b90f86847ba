//! Core building blocks for the release pipeline
//!
//! - **config**: release.toml parsing, validation, and ddk defaults
//! - **error**: error types with contextual help messages
//! - **exec**: subprocess execution with explicit working directories

pub mod config;
pub mod error;
pub mod exec;
