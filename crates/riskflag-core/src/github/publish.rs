// SPDX-License-Identifier: Apache-2.0

//! Writing results back to the pull request.
//!
//! Three independent best-effort writes: making sure the category labels
//! exist, attaching the chosen label, and posting the comment. None of them
//! is retried and none of them fails the run.

use anyhow::Context;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::PrTarget;
use super::metadata::get_all_pages;
use crate::interpret::Category;
use crate::soft::Soft;

#[derive(Debug, Deserialize)]
struct LabelEntry {
    name: String,
}

/// Outcome of [`ensure_labels`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelSync {
    /// Labels that were missing and got created.
    pub created: Vec<Category>,
    /// Labels that already existed.
    pub existing: Vec<Category>,
    /// Diagnostics for labels whose creation failed.
    pub failures: Vec<String>,
}

/// Creates each category label that the repository does not have yet.
///
/// Existing labels are listed once; only missing names are created, so a
/// second call with the same categories issues no create requests.
#[instrument(skip(client, categories), fields(repo = %target.full_name()))]
pub async fn ensure_labels(
    client: &Octocrab,
    target: &PrTarget,
    categories: &[Category],
) -> Soft<LabelSync> {
    let route = format!("/repos/{}/labels", target.full_name());

    let existing: Vec<LabelEntry> = match get_all_pages(client, &route)
        .await
        .context("Failed to retrieve labels")
    {
        Ok(labels) => labels,
        Err(err) => return Soft::from_result("ensure_labels", Err(err)),
    };

    let mut sync = LabelSync::default();
    for &category in categories {
        if existing.iter().any(|label| label.name == category.as_str()) {
            debug!(label = %category, "Label already exists");
            sync.existing.push(category);
            continue;
        }

        let payload = serde_json::json!({
            "name": category.as_str(),
            "color": category.color(),
            "description": category.description(),
        });
        match client
            .post::<_, serde_json::Value>(route.as_str(), Some(&payload))
            .await
        {
            Ok(_) => {
                info!(label = %category, "Label created");
                sync.created.push(category);
            }
            Err(err) => {
                let diagnostic = format!("Failed to create label '{category}': {err}");
                warn!(label = %category, error = %err, "Failed to create label");
                sync.failures.push(diagnostic);
            }
        }
    }

    Soft::Ok(sync)
}

/// Adds the category label to the pull request.
#[instrument(skip(client), fields(target = %target))]
pub async fn attach_label(client: &Octocrab, target: &PrTarget, category: Category) -> Soft<()> {
    let route = format!(
        "/repos/{}/issues/{}/labels",
        target.full_name(),
        target.number
    );
    let payload = serde_json::json!({ "labels": [category.as_str()] });

    let result = client
        .post::<_, serde_json::Value>(route, Some(&payload))
        .await
        .map(|_| ())
        .with_context(|| format!("Failed to add label '{category}' to PR #{}", target.number));

    if result.is_ok() {
        info!(label = %category, "Label added to PR");
    }
    Soft::from_result("attach_label", result)
}

/// Posts `body` as a new comment on the pull request's discussion thread.
///
/// Returns the comment URL when GitHub reports one.
#[instrument(skip(client, body), fields(target = %target, body_len = body.len()))]
pub async fn post_comment(
    client: &Octocrab,
    target: &PrTarget,
    body: &str,
) -> Soft<Option<String>> {
    let route = format!(
        "/repos/{}/issues/{}/comments",
        target.full_name(),
        target.number
    );
    let payload = serde_json::json!({ "body": body });

    let result = client
        .post::<_, serde_json::Value>(route, Some(&payload))
        .await
        .with_context(|| format!("Failed to add comment to PR #{}", target.number))
        .map(|comment| {
            comment
                .get("html_url")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });

    if let Ok(url) = &result {
        info!(url = url.as_deref().unwrap_or("-"), "Comment added to PR");
    }
    Soft::from_result("post_comment", result)
}
