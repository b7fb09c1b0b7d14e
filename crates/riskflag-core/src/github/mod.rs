// SPDX-License-Identifier: Apache-2.0

//! GitHub integration module.
//!
//! Read side ([`metadata`]) gathers the pull request context; write side
//! ([`publish`]) manages category labels and posts the review comment.

use std::fmt;

use anyhow::Context;
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use crate::error::RiskflagError;

pub mod metadata;
pub mod publish;

/// The pull request a run operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrTarget {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
}

impl PrTarget {
    /// Validates and builds a target.
    ///
    /// # Errors
    ///
    /// Returns `RiskflagError::InvalidTarget` if owner or repo is empty, either
    /// contains a `/`, or the number is zero.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        number: u64,
    ) -> Result<Self, RiskflagError> {
        let owner = owner.into().trim().to_string();
        let repo = repo.into().trim().to_string();
        if owner.is_empty() || repo.is_empty() || owner.contains('/') || repo.contains('/') {
            return Err(RiskflagError::InvalidTarget {
                message: format!("expected non-empty owner and repo, got '{owner}/{repo}'"),
            });
        }
        if number == 0 {
            return Err(RiskflagError::InvalidTarget {
                message: "pull request number must be positive".to_string(),
            });
        }
        Ok(Self {
            owner,
            repo,
            number,
        })
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for PrTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Parses an owner/repo string to extract owner and repo.
///
/// Validates format: exactly one `/`, non-empty parts.
///
/// # Errors
///
/// Returns `RiskflagError::InvalidTarget` if the format is invalid.
pub fn parse_owner_repo(s: &str) -> Result<(String, String), RiskflagError> {
    let parts: Vec<&str> = s.trim().split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(RiskflagError::InvalidTarget {
            message: format!("expected owner/repo, got '{s}'"),
        });
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Creates an authenticated GitHub client against `api_url`.
///
/// octocrab's own retry layer is disabled: every read and write is sent
/// exactly once.
///
/// # Errors
///
/// Returns an error if the base URL is invalid or the client cannot be built.
pub fn build_client(api_url: &str, token: &SecretString) -> anyhow::Result<Octocrab> {
    let client = Octocrab::builder()
        .add_retry_config(RetryConfig::None)
        .base_uri(api_url.trim_end_matches('/'))
        .with_context(|| format!("Invalid GitHub API URL: {api_url}"))?
        .personal_token(token.expose_secret().to_string())
        .build()
        .context("Failed to build GitHub client")?;

    debug!(api_url, "Created authenticated GitHub client");
    Ok(client)
}
