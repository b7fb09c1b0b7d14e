// SPDX-License-Identifier: Apache-2.0

//! Soft-failure results for best-effort pipeline steps.
//!
//! Every GitHub read and write in a run returns a [`Soft`] value: either the
//! result, or a diagnostic that has already been logged. The pipeline keeps
//! going either way and decides at the top level which failures change the
//! process exit code.

use std::fmt;

use tracing::warn;

/// Value-or-diagnostic outcome of a best-effort operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Soft<T> {
    /// The operation succeeded.
    Ok(T),
    /// The operation failed; the run continues without its result.
    Failed {
        /// Short name of the operation (e.g. `fetch_diff`).
        operation: &'static str,
        /// Human-readable description of the failure.
        diagnostic: String,
    },
}

impl<T> Soft<T> {
    /// Converts an `anyhow` result, logging a warning on failure.
    pub fn from_result(operation: &'static str, result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Soft::Ok(value),
            Err(err) => Soft::failed(operation, format!("{err:#}")),
        }
    }

    /// Builds a failed outcome and logs it.
    pub fn failed(operation: &'static str, diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        warn!(operation, diagnostic = %diagnostic, "Operation failed, continuing");
        Soft::Failed {
            operation,
            diagnostic,
        }
    }

    /// Returns `true` if the operation succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Soft::Ok(_))
    }

    /// Returns `true` if the operation failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.is_ok()
    }

    /// Returns the diagnostic of a failed outcome.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Soft::Ok(_) => None,
            Soft::Failed { diagnostic, .. } => Some(diagnostic),
        }
    }

    /// Discards the diagnostic.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Soft::Ok(value) => Some(value),
            Soft::Failed { .. } => None,
        }
    }
}

impl<T> fmt::Display for Soft<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Soft::Ok(_) => write!(f, "ok"),
            Soft::Failed {
                operation,
                diagnostic,
            } => write!(f, "{operation}: {diagnostic}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_ok() {
        let soft = Soft::from_result("fetch_diff", Ok::<_, anyhow::Error>("diff".to_string()));
        assert!(soft.is_ok());
        assert_eq!(soft.diagnostic(), None);
        assert_eq!(soft.ok(), Some("diff".to_string()));
    }

    #[test]
    fn test_from_result_keeps_error_chain() {
        let err =
            anyhow::anyhow!("HTTP 404").context("Failed to fetch diff for PR #7");
        let soft: Soft<String> = Soft::from_result("fetch_diff", Err(err));
        assert!(soft.is_failed());
        assert_eq!(
            soft.diagnostic(),
            Some("Failed to fetch diff for PR #7: HTTP 404")
        );
        assert_eq!(
            soft.to_string(),
            "fetch_diff: Failed to fetch diff for PR #7: HTTP 404"
        );
    }
}
