// SPDX-License-Identifier: Apache-2.0

//! Triage and summarize commands.

use std::path::Path;

use anyhow::{Context, Result};
use riskflag_core::{
    AppConfig, Pipeline, PrTarget, RiskflagError, Variant, load_config, parse_owner_repo,
};
use tracing::{debug, info};

use crate::cli::{OutputContext, RunArgs};
use crate::output;
use crate::provider::CliTokenProvider;

/// Applies command-line and CI environment overrides on top of the loaded config.
pub fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if let Some(url) = &args.llama_url {
        config.completion.base_url.clone_from(url);
        debug!(url = %url, "Overriding completion base URL");
    }
    if let Some(url) = &args.github_api_url {
        config.github.api_url.clone_from(url);
        debug!(url = %url, "Overriding GitHub API URL");
    }
    if let Some(rules) = args.rules_override.as_ref().filter(|r| !r.is_empty()) {
        config.github.rules_override = Some(rules.clone());
    }
    if args.dry_run {
        config.review.dry_run = true;
    }
    if let Some(path) = &args.system_prompt {
        config.prompt.system_prompt_path.clone_from(path);
    }
    if let Some(attempts) = args.max_attempts {
        config.completion.max_attempts = attempts;
    }
}

/// Parses `owner/repo#number`.
fn parse_reference(reference: &str) -> Result<PrTarget, RiskflagError> {
    let (repo, number) = reference
        .split_once('#')
        .ok_or_else(|| RiskflagError::InvalidTarget {
            message: format!("expected owner/repo#number, got '{reference}'"),
        })?;
    let number = number.parse::<u64>().map_err(|_| RiskflagError::InvalidTarget {
        message: format!("invalid pull request number in '{reference}'"),
    })?;
    let (owner, repo) = parse_owner_repo(repo)?;
    PrTarget::new(owner, repo, number)
}

/// Resolves the pull request from the positional target, or from `--owner`,
/// `--repo` and `--pr`.
///
/// `--repo` may carry `owner/name` when `--owner` is absent.
pub fn resolve_target(args: &RunArgs) -> Result<PrTarget, RiskflagError> {
    if let Some(reference) = &args.target {
        return parse_reference(reference);
    }

    let repo = args
        .repo
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| RiskflagError::InvalidTarget {
            message: "repository is required (--repo or REPO)".to_string(),
        })?;
    let number = args.pr_number.ok_or_else(|| RiskflagError::InvalidTarget {
        message: "pull request number is required (--pr or PR_NUMBER)".to_string(),
    })?;

    match args.owner.as_deref().filter(|o| !o.trim().is_empty()) {
        Some(owner) => PrTarget::new(owner, repo, number),
        None => {
            let (owner, repo) = parse_owner_repo(repo)?;
            PrTarget::new(owner, repo, number)
        }
    }
}

/// Runs one pipeline variant and renders its report.
pub async fn run(
    args: RunArgs,
    variant: Variant,
    ctx: OutputContext,
    config_path: Option<&Path>,
) -> Result<u8> {
    let mut config = load_config(config_path).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    debug!(?config, "Configuration loaded");

    let target = resolve_target(&args)?;
    let tokens = CliTokenProvider::new(args.token);
    let pipeline = Pipeline::from_config(config, &tokens)?;

    info!(target = %target, variant = %variant, "Starting run");
    let report = pipeline.run(&target, variant).await;
    output::render(&report, &ctx)?;
    Ok(report.exit_code())
}
