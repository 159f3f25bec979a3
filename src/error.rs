//! Error types for Hubble.
//!
//! This module defines the crate-level error type, aggregating plan,
//! configuration, and module failures with enough context for user feedback.

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Hubble operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Hubble.
#[derive(Error, Debug)]
pub enum Error {
    /// Error parsing a plan file.
    #[error("Failed to parse plan '{path}': {message}")]
    PlanParse {
        /// Path to the plan file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Error validating plan contents.
    #[error("Plan validation failed: {0}")]
    PlanValidation(String),

    /// Module execution failed.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Module(_) => 2,
            Error::Config(_) => 3,
            Error::PlanParse { .. } | Error::PlanValidation(_) | Error::YamlParse(_) => 4,
            _ => 1,
        }
    }
}
