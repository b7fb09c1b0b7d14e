// SPDX-License-Identifier: Apache-2.0

//! CLI-specific `TokenProvider` implementation.
//!
//! Resolves the GitHub token from the `--token` flag, then the
//! `GITHUB_TOKEN` and `GH_TOKEN` environment variables.

use riskflag_core::TokenProvider;
use secrecy::SecretString;
use tracing::debug;

/// Environment variables checked after the flag, in order.
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// CLI implementation of `TokenProvider`.
pub struct CliTokenProvider {
    explicit: Option<String>,
}

impl CliTokenProvider {
    /// Creates a provider preferring `explicit` (the `--token` value).
    pub fn new(explicit: Option<String>) -> Self {
        Self { explicit }
    }
}

impl TokenProvider for CliTokenProvider {
    fn github_token(&self) -> Option<SecretString> {
        if let Some(token) = self.explicit.as_deref().filter(|t| !t.trim().is_empty()) {
            debug!("Resolved GitHub token from --token");
            return Some(SecretString::from(token.to_string()));
        }

        for var in TOKEN_ENV_VARS {
            match std::env::var(var) {
                Ok(token) if !token.trim().is_empty() => {
                    debug!(source = var, "Resolved GitHub token from environment variable");
                    return Some(SecretString::from(token));
                }
                _ => {}
            }
        }

        debug!("No GitHub token found");
        None
    }
}
