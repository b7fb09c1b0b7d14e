// SPDX-License-Identifier: Apache-2.0

//! Prompt rendering.
//!
//! A prompt is the system instruction document followed by a user section
//! rendered from the [`PullRequestContext`]. Nothing is escaped: text from the
//! diff or commit messages is inserted verbatim, section markers included.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::RiskflagError;
use crate::github::metadata::{
    DEFAULT_DESCRIPTION, DEFAULT_RULES, DEFAULT_TITLE, PullRequestContext,
};
use crate::pipeline::Variant;

/// Separator placed between commit messages in the summary prompt.
pub const COMMIT_SEPARATOR: &str = "\n---\n";

/// The system instruction document, loaded once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    /// Reads the document from disk.
    ///
    /// # Errors
    ///
    /// Returns `RiskflagError::SystemPrompt` if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, RiskflagError> {
        let text = std::fs::read_to_string(path).map_err(|source| RiskflagError::SystemPrompt {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "Loaded system prompt");
        Ok(Self(text))
    }

    /// Returns the document text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SystemPrompt {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// A fully rendered prompt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Wraps already rendered text.
    #[must_use]
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders the user section for the given variant.
///
/// Order is stable: PR title, repository name and description, rules, then
/// either the diff (triage) or the PR description and commit messages
/// (summary).
#[must_use]
pub fn render_user_section(context: &PullRequestContext, variant: Variant) -> String {
    let title = context.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let description = context
        .repo_description
        .as_deref()
        .unwrap_or(DEFAULT_DESCRIPTION);
    let rules = context.rules.as_deref().unwrap_or(DEFAULT_RULES);

    let mut user = format!(
        "\nTitle: {title}\n--- {} ---\n{description}\n\nRules: {rules}\n\n",
        context.repository
    );

    match variant {
        Variant::Triage => {
            let diff = context.diff.as_deref().unwrap_or_default();
            user.push_str(&format!("Diff:\n{diff}\n"));
        }
        Variant::Summary => {
            let body = context.body.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
            let commits = context.commit_messages.join(COMMIT_SEPARATOR);
            user.push_str(&format!("Description:\n{body}\n\nCommits:\n{commits}\n"));
        }
    }
    user
}

/// Builds the full prompt from the system document and the rendered context.
#[must_use]
pub fn build_prompt(
    system: &SystemPrompt,
    context: &PullRequestContext,
    variant: Variant,
) -> Prompt {
    let user = render_user_section(context, variant);
    Prompt(format!(
        "### System Prompt\n{}\n\n### User Message\n{user}\n### Assistant\n",
        system.as_str()
    ))
}
