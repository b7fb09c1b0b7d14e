// SPDX-License-Identifier: Apache-2.0

//! Pull request metadata fetching.
//!
//! Each read is one authenticated GET with an explicit GitHub media type.
//! Reads never abort the run: a failed read yields a [`Soft::Failed`] value,
//! the field stays absent on the [`PullRequestContext`], and the failure is
//! recorded for the final report.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::PrTarget;
use crate::config::GitHubConfig;
use crate::pipeline::Variant;
use crate::soft::Soft;

/// Media type for JSON resources.
pub const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Media type selecting the unified diff of a pull request.
pub const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

/// Rules text used when the rules file cannot be read.
pub const DEFAULT_RULES: &str = "No additional rules provided";

/// Placeholder for a pull request without a title.
pub const DEFAULT_TITLE: &str = "No title provided.";

/// Placeholder for a missing PR body or repository description.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// Page size for paginated list endpoints.
pub(crate) const PER_PAGE: usize = 100;

/// Upper bound on pages fetched from a list endpoint.
const MAX_PAGES: u32 = 10;

#[derive(Debug, Deserialize)]
struct PullResponse {
    title: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

/// Title and body of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrDescription {
    /// PR title.
    pub title: String,
    /// PR body (markdown).
    pub body: String,
}

/// A metadata read that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Name of the failed read.
    pub operation: String,
    /// What went wrong.
    pub diagnostic: String,
}

/// Everything the prompt is rendered from.
///
/// Built once per run from API responses and never mutated afterwards.
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct PullRequestContext {
    /// Repository full name (`owner/repo`).
    pub repository: String,
    /// Pull request number.
    pub number: u64,
    /// PR title.
    pub title: Option<String>,
    /// PR body.
    pub body: Option<String>,
    /// Unified diff text.
    pub diff: Option<String>,
    /// Commit messages in PR order.
    #[builder(default)]
    pub commit_messages: Vec<String>,
    /// Repository description.
    pub repo_description: Option<String>,
    /// Free-text review rules.
    pub rules: Option<String>,
    /// Reads that failed while building this context.
    #[builder(default)]
    pub failures: Vec<FetchFailure>,
}

impl PullRequestContext {
    /// Returns `true` when the input the variant cannot do without is missing.
    ///
    /// Triage needs the diff; summary needs the PR title and body.
    #[must_use]
    pub fn primary_input_missing(&self, variant: Variant) -> bool {
        match variant {
            Variant::Triage => self.diff.is_none(),
            Variant::Summary => self.title.is_none(),
        }
    }

    fn record<T>(&mut self, soft: Soft<T>) -> Option<T> {
        match soft {
            Soft::Ok(value) => Some(value),
            Soft::Failed {
                operation,
                diagnostic,
            } => {
                self.failures.push(FetchFailure {
                    operation: operation.to_string(),
                    diagnostic,
                });
                None
            }
        }
    }
}

/// Performs a GET with the given `Accept` media type and returns the body.
///
/// Any non-success status is turned into an error carrying the status and body.
pub(crate) async fn get_with_accept(
    client: &Octocrab,
    route: &str,
    accept: &'static str,
) -> Result<String> {
    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::ACCEPT, http::HeaderValue::from_static(accept));

    let response = client
        ._get_with_headers(route, Some(headers))
        .await
        .with_context(|| format!("GET {route} failed"))?;
    let status = response.status();
    let body = client
        .body_to_string(response)
        .await
        .with_context(|| format!("Failed to read response body of GET {route}"))?;

    if !status.is_success() {
        bail!("GET {route} returned HTTP {}: {}", status.as_u16(), body.trim());
    }
    Ok(body)
}

/// GETs a JSON resource and deserializes it.
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Octocrab, route: &str) -> Result<T> {
    let body = get_with_accept(client, route, JSON_MEDIA_TYPE).await?;
    serde_json::from_str(&body)
        .with_context(|| format!("Unexpected JSON from GET {route}"))
}

/// GETs every page of a JSON list endpoint.
pub(crate) async fn get_all_pages<T: DeserializeOwned>(
    client: &Octocrab,
    route: &str,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for page in 1..=MAX_PAGES {
        let batch: Vec<T> =
            get_json(client, &format!("{route}?per_page={PER_PAGE}&page={page}")).await?;
        let done = batch.len() < PER_PAGE;
        items.extend(batch);
        if done {
            break;
        }
    }
    Ok(items)
}

/// Fetches the PR title and body.
#[instrument(skip(client), fields(target = %target))]
pub async fn fetch_pull_request(client: &Octocrab, target: &PrTarget) -> Soft<PrDescription> {
    let route = format!("/repos/{}/pulls/{}", target.full_name(), target.number);
    let result = get_json::<PullResponse>(client, &route)
        .await
        .with_context(|| format!("Failed to retrieve PR description for {target}"))
        .map(|pr| PrDescription {
            title: pr.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: pr.body.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        });
    Soft::from_result("fetch_pull_request", result)
}

/// Fetches the unified diff of the PR.
#[instrument(skip(client), fields(target = %target))]
pub async fn fetch_diff(client: &Octocrab, target: &PrTarget) -> Soft<String> {
    let route = format!("/repos/{}/pulls/{}", target.full_name(), target.number);
    let result = get_with_accept(client, &route, DIFF_MEDIA_TYPE)
        .await
        .with_context(|| format!("Failed to retrieve diff for {target}"));
    if let Ok(diff) = &result {
        debug!(diff_bytes = diff.len(), "Diff fetched");
    }
    Soft::from_result("fetch_diff", result)
}

/// Fetches the repository description.
#[instrument(skip(client), fields(target = %target))]
pub async fn fetch_repo_description(client: &Octocrab, target: &PrTarget) -> Soft<String> {
    let route = format!("/repos/{}", target.full_name());
    let result = get_json::<RepoResponse>(client, &route)
        .await
        .with_context(|| {
            format!(
                "Failed to retrieve repository information for {}",
                target.full_name()
            )
        })
        .map(|repo| repo.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()));
    Soft::from_result("fetch_repo_description", result)
}

/// Fetches every commit message of the PR, in order.
#[instrument(skip(client), fields(target = %target))]
pub async fn fetch_commit_messages(client: &Octocrab, target: &PrTarget) -> Soft<Vec<String>> {
    let route = format!(
        "/repos/{}/pulls/{}/commits",
        target.full_name(),
        target.number
    );
    let result = get_all_pages::<CommitEntry>(client, &route)
        .await
        .with_context(|| format!("Failed to retrieve commits for {target}"))
        .map(|commits| commits.into_iter().map(|c| c.commit.message).collect::<Vec<_>>());
    if let Ok(messages) = &result {
        debug!(count = messages.len(), "Commit messages fetched");
    }
    Soft::from_result("fetch_commit_messages", result)
}

/// Fetches the free-text review rules.
///
/// A non-empty `rules_override` is returned verbatim without any request.
#[instrument(skip(client, rules_override), fields(target = %target))]
pub async fn fetch_rules(
    client: &Octocrab,
    target: &PrTarget,
    rules_path: &str,
    rules_override: Option<&str>,
) -> Soft<String> {
    if let Some(rules) = rules_override.filter(|r| !r.is_empty()) {
        debug!("Using rules override");
        return Soft::Ok(rules.to_string());
    }

    let route = format!(
        "/repos/{}/contents/{}",
        target.full_name(),
        rules_path.trim_start_matches('/')
    );
    let result = async {
        let content: ContentResponse = get_json(client, &route).await?;
        decode_content(content)
    }
    .await
    .with_context(|| format!("Failed to retrieve rules file {rules_path}"));
    Soft::from_result("fetch_rules", result)
}

fn decode_content(content: ContentResponse) -> Result<String> {
    let raw = content.content.context("Contents response has no content")?;
    match content.encoding.as_deref() {
        Some("base64") => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact)
                .context("Rules file is not valid base64")?;
            String::from_utf8(bytes).context("Rules file is not valid UTF-8")
        }
        _ => Ok(raw),
    }
}

/// Gathers the context the given variant renders.
///
/// Only the reads the variant needs are performed. Failed reads are
/// recorded on the returned context; a failed rules read falls back to
/// [`DEFAULT_RULES`] and is not counted as a failure.
#[instrument(skip(client, config), fields(target = %target, variant = %variant))]
pub async fn fetch_context(
    client: &Octocrab,
    target: &PrTarget,
    config: &GitHubConfig,
    variant: Variant,
) -> PullRequestContext {
    let mut context = PullRequestContext::builder()
        .repository(target.full_name())
        .number(target.number)
        .build();

    let description = fetch_repo_description(client, target).await;
    context.repo_description = context.record(description);

    let pr = fetch_pull_request(client, target).await;
    if let Some(pr) = context.record(pr) {
        context.title = Some(pr.title);
        context.body = Some(pr.body);
    }

    match variant {
        Variant::Triage => {
            let diff = fetch_diff(client, target).await;
            context.diff = context.record(diff);
        }
        Variant::Summary => {
            let commits = fetch_commit_messages(client, target).await;
            context.commit_messages = context.record(commits).unwrap_or_default();
        }
    }

    let rules = fetch_rules(
        client,
        target,
        &config.rules_path,
        config.rules_override.as_deref(),
    )
    .await;
    context.rules = Some(rules.ok().unwrap_or_else(|| DEFAULT_RULES.to_string()));

    info!(
        failures = context.failures.len(),
        "Pull request context gathered"
    );
    context
}
