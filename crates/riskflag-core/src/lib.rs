// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Riskflag Core
//!
//! Core library for riskflag - LLM-assisted pull request risk triage for CI.
//!
//! A run gathers pull request metadata from GitHub, renders a prompt, asks a
//! locally hosted completion server for a verdict, and writes the result back
//! to the pull request as a category label and a comment.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use riskflag_core::{Pipeline, PrTarget, StaticTokenProvider, Variant, load_config};
//!
//! # async fn example() -> riskflag_core::Result<()> {
//! let config = load_config(None)?;
//! let tokens = StaticTokenProvider::new(std::env::var("GITHUB_TOKEN").ok());
//! let pipeline = Pipeline::from_config(config, &tokens)?;
//!
//! let target = PrTarget::new("octocat", "hello-world", 42)?;
//! let report = pipeline.run(&target, Variant::Triage).await;
//! println!("category: {:?}, exit code {}", report.category, report.exit_code());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ai`] - Prompt rendering and the completion client
//! - [`config`] - Configuration loading and paths
//! - [`error`] - Error types
//! - [`github`] - Metadata reads and label/comment writes
//! - [`interpret`] - Category extraction from model replies
//! - [`pipeline`] - Triage and summary runners

// ============================================================================
// Authentication
// ============================================================================

pub use auth::{StaticTokenProvider, TokenProvider};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::RiskflagError;
pub use soft::Soft;

/// Convenience Result type for riskflag operations.
///
/// This is equivalent to `std::result::Result<T, RiskflagError>`.
pub type Result<T> = std::result::Result<T, RiskflagError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AppConfig, CompletionConfig, GitHubConfig, PromptConfig, ReviewConfig, config_dir,
    config_file_path, load_config,
};

// ============================================================================
// GitHub Integration
// ============================================================================

pub use github::metadata::{FetchFailure, PullRequestContext};
pub use github::publish::LabelSync;
pub use github::{PrTarget, parse_owner_repo};

// ============================================================================
// Completion
// ============================================================================

pub use ai::{CompletionClient, ModelReply, Prompt, SystemPrompt, build_prompt};

// ============================================================================
// Classification
// ============================================================================

pub use interpret::{Category, Interpretation, interpret};

// ============================================================================
// Pipeline
// ============================================================================

pub use pipeline::{Pipeline, RunReport, RunStatus, Variant};

// ============================================================================
// Modules
// ============================================================================

pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod interpret;
pub mod pipeline;
pub mod retry;
pub mod soft;
