// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the riskflag CLI.

pub mod review;

use std::path::Path;

use anyhow::Result;
use riskflag_core::Variant;

use crate::cli::{Commands, OutputContext};

/// Dispatch to the appropriate command handler.
///
/// Returns the process exit code of a completed run.
pub async fn run(command: Commands, ctx: OutputContext, config_path: Option<&Path>) -> Result<u8> {
    match command {
        Commands::Triage(args) => review::run(args, Variant::Triage, ctx, config_path).await,
        Commands::Summarize(args) => review::run(args, Variant::Summary, ctx, config_path).await,
    }
}
