// SPDX-License-Identifier: Apache-2.0

//! Configuration management for riskflag.
//!
//! Provides layered configuration from files and environment variables.
//! The resulting [`AppConfig`] is built once at process start and passed by
//! reference into every pipeline component.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `RISKFLAG_`)
//! 2. Config file: `--config <path>`, else `./riskflag.toml`, else
//!    `~/.config/riskflag/config.toml`
//! 3. Built-in defaults
//!
//! CLI flags and the CI variables (`OWNER`, `LLAMA_URL`, ...) are applied on
//! top of the loaded config by the binary.
//!
//! # Examples
//!
//! ```bash
//! # Allow five completion attempts via environment variable
//! RISKFLAG_COMPLETION__MAX_ATTEMPTS=5 riskflag triage
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::RiskflagError;

/// File name looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_FILE: &str = "riskflag.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GitHub API settings.
    pub github: GitHubConfig,
    /// Completion endpoint settings.
    pub completion: CompletionConfig,
    /// Prompt settings.
    pub prompt: PromptConfig,
    /// Publishing behaviour.
    pub review: ReviewConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL.
    pub api_url: String,
    /// Repository file holding free-text review rules.
    pub rules_path: String,
    /// Rules text used verbatim instead of fetching `rules_path`.
    pub rules_override: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            rules_path: "code-rev-rules.txt".to_string(),
            rules_override: None,
        }
    }
}

/// Completion endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of the local completion server; requests go to `{base_url}/completion`.
    pub base_url: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// Total attempts for the triage variant (the summary variant always makes one).
    pub max_attempts: u32,
    /// Fixed delay between attempts, in seconds.
    pub retry_delay_seconds: u64,
    /// Optional request timeout; `None` keeps the transport default.
    pub timeout_seconds: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            temperature: 0.0,
            max_attempts: 3,
            retry_delay_seconds: 2,
            timeout_seconds: None,
        }
    }
}

/// Prompt settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Path of the system instruction document.
    pub system_prompt_path: PathBuf,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: PathBuf::from("system_prompt.txt"),
        }
    }
}

/// Publishing behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Skip posting the PR comment; every other step still runs.
    pub dry_run: bool,
    /// Post the diagnostic as a comment when every completion attempt failed.
    pub post_completion_failures: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            post_completion_failures: true,
        }
    }
}

/// Returns the riskflag configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/riskflag`. Returns `None` when no
/// home directory can be determined (common in minimal CI containers).
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(PathBuf::from(xdg_config).join("riskflag"));
    }
    dirs::home_dir().map(|home| home.join(".config").join("riskflag"))
}

/// Resolves which config file to read.
///
/// An explicit path always wins. Otherwise the first existing file among
/// `./riskflag.toml` and the user config file is used.
#[must_use]
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load application configuration.
///
/// Loads from the resolved config file (if any) and environment variables.
/// Environment variables use the prefix `RISKFLAG_` and double underscore
/// for nested keys (e.g., `RISKFLAG_COMPLETION__BASE_URL`).
///
/// # Errors
///
/// Returns `RiskflagError::Config` if an explicit file is missing or any
/// source holds an invalid value.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, RiskflagError> {
    let mut builder = Config::builder();

    if let Some(path) = config_file_path(explicit) {
        builder = builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(explicit.is_some()),
        );
    }

    let config = builder
        .add_source(
            Environment::with_prefix("RISKFLAG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}
