// SPDX-License-Identifier: Apache-2.0

//! Error types for riskflag.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.
//!
//! These errors are reserved for fatal setup problems. Once a run is under
//! way, fetch and write failures degrade to [`crate::soft::Soft`] values instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up a riskflag run.
#[derive(Error, Debug)]
pub enum RiskflagError {
    /// GitHub API error from octocrab.
    #[error("GitHub API error: {message}")]
    GitHub {
        /// Error message.
        message: String,
    },

    /// Completion endpoint error.
    #[error("Completion endpoint error: {message}")]
    Completion {
        /// Error message.
        message: String,
        /// Optional HTTP status code returned by the endpoint.
        status: Option<u16>,
    },

    /// No GitHub token could be resolved.
    #[error("Authentication required - set GITHUB_TOKEN or pass --token")]
    NotAuthenticated,

    /// Repository or pull request identifier is malformed.
    #[error("Invalid pull request target: {message}")]
    InvalidTarget {
        /// Error message.
        message: String,
    },

    /// Configuration file or environment error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// The system instruction document could not be read.
    #[error("Failed to read system prompt from {}", path.display())]
    SystemPrompt {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Network/HTTP error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<config::ConfigError> for RiskflagError {
    fn from(err: config::ConfigError) -> Self {
        RiskflagError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_error_names_path() {
        let err = RiskflagError::SystemPrompt {
            path: PathBuf::from("system_prompt.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read system prompt from system_prompt.txt"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: RiskflagError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, RiskflagError::Config { .. }));
        assert!(err.to_string().contains("bad value"));
    }
}
