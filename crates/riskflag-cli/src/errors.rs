// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `RiskflagError` to pick a hint and an exit
//! code. Every library error reaching this point is a setup problem, so they
//! all map to [`EXIT_CONFIG`].

use anyhow::Error;
use riskflag_core::RiskflagError;

/// Exit code for configuration problems (missing token, bad target, ...).
pub const EXIT_CONFIG: u8 = 2;

/// Exit code for failures outside the pipeline, such as writing the report.
pub const EXIT_INTERNAL: u8 = 1;

/// Formats an error for CLI display with helpful hints.
///
/// If the error is not a `RiskflagError`, returns the error chain.
pub fn format_error(error: &Error) -> String {
    let Some(err) = error.downcast_ref::<RiskflagError>() else {
        return format!("{error:#}");
    };

    match err {
        RiskflagError::NotAuthenticated => format!(
            "{err}\n\nTip: In GitHub Actions, pass `GITHUB_TOKEN: ${{{{ secrets.GITHUB_TOKEN }}}}` to the step."
        ),
        RiskflagError::InvalidTarget { .. } => format!(
            "{err}\n\nTip: Set OWNER, REPO and PR_NUMBER, or pass --repo owner/name --pr <NUMBER>."
        ),
        RiskflagError::SystemPrompt { source, .. } => format!(
            "{err}: {source}\n\nTip: Pass --system-prompt <PATH> or set prompt.system_prompt_path."
        ),
        RiskflagError::Config { .. } => {
            let hint = riskflag_core::config_file_path(None).map_or_else(
                || "Check RISKFLAG_* environment variables.".to_string(),
                |path| format!("Check your config file at {}", path.display()),
            );
            format!("{err}\n\nTip: {hint}")
        }
        RiskflagError::Completion { .. } | RiskflagError::Network(_) => {
            format!("{err}\n\nTip: Check --llama-url / LLAMA_URL.")
        }
        RiskflagError::GitHub { .. } => {
            format!("{err}\n\nTip: Check --github-api-url / GITHUB_API_URL.")
        }
    }
}

/// Exit code for an error that aborted the run before the pipeline started.
pub fn exit_code(error: &Error) -> u8 {
    if error.downcast_ref::<RiskflagError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_INTERNAL
    }
}
