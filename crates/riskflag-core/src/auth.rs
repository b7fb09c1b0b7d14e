// SPDX-License-Identifier: Apache-2.0

//! Token provider abstraction for credential resolution.
//!
//! The library never reads credentials from ambient state on its own. The
//! binary implements [`TokenProvider`] over its flags and environment, and
//! the pipeline asks it once for the GitHub token.

use secrecy::SecretString;

/// Provides the GitHub credential for API calls.
pub trait TokenProvider: Send + Sync {
    /// Retrieves the GitHub API token.
    ///
    /// Returns `None` if no token is available from any source.
    fn github_token(&self) -> Option<SecretString>;
}

/// A token provider over a fixed, already-resolved token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: Option<SecretString>,
}

impl StaticTokenProvider {
    /// Wraps a token, treating an empty string as absent.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn github_token(&self) -> Option<SecretString> {
        self.token.clone()
    }
}
