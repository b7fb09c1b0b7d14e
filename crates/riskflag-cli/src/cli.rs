// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for riskflag.
//!
//! Uses clap's derive API. Every pull request option can also be supplied
//! through the environment variables a CI job usually exports, so the
//! binary runs unchanged inside a workflow step.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Text,
    /// JSON run report for programmatic consumption
    Json,
}

/// Global output configuration passed to commands.
#[derive(Clone, Copy, Debug)]
pub struct OutputContext {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Include failure details in text output
    pub verbose: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }
}

/// riskflag - LLM-assisted pull request risk triage for CI.
///
/// Classifies a pull request as BLUE, RED or BLACK with a locally hosted
/// model, labels it, and comments with the model's reasoning.
#[derive(Parser, Debug)]
#[command(name = "riskflag")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Enable verbose output (debug-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a pull request, label it and comment
    Triage(RunArgs),

    /// Summarize a pull request from its description and commits
    Summarize(RunArgs),
}

/// Pull request selection and per-run overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Pull request as owner/repo#number (takes precedence over the flags below)
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Repository owner
    #[arg(long, env = "OWNER")]
    pub owner: Option<String>,

    /// Repository name, or owner/name when --owner is not given
    #[arg(long, env = "REPO")]
    pub repo: Option<String>,

    /// Pull request number
    #[arg(long = "pr", env = "PR_NUMBER", value_name = "NUMBER")]
    pub pr_number: Option<u64>,

    /// GitHub token (falls back to GH_TOKEN)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the local completion server
    #[arg(long, env = "LLAMA_URL", value_name = "URL")]
    pub llama_url: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", value_name = "URL")]
    pub github_api_url: Option<String>,

    /// Review rules to use instead of the repository rules file
    #[arg(long, env = "RULES_OVERRIDE", value_name = "TEXT")]
    pub rules_override: Option<String>,

    /// Run every step but do not post the comment
    #[arg(
        long,
        env = "DRY_RUN",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub dry_run: bool,

    /// Path to the system prompt document
    #[arg(long, value_name = "PATH")]
    pub system_prompt: Option<PathBuf>,

    /// Total completion attempts (triage only)
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,
}
