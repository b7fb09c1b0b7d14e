// SPDX-License-Identifier: Apache-2.0

//! riskflag - LLM-assisted pull request risk triage for CI.
//!
//! Fetches a pull request from GitHub, asks a locally hosted model to
//! classify or summarize it, and writes the verdict back as a label and a
//! comment.
//!
//! Exit codes: `0` success, `2` configuration error, `3` the pull request
//! diff or detail could not be fetched, `4` every completion attempt failed.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;
mod provider;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{Cli, OutputContext};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let output_ctx = OutputContext::from_cli(cli.output, cli.verbose);

    match commands::run(cli.command, output_ctx, cli.config.as_deref()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            ExitCode::from(errors::exit_code(&e))
        }
    }
}
