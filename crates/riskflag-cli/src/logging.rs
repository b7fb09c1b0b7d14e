// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the riskflag CLI.
//!
//! Uses `tracing` with `tracing-subscriber` for structured logging to stderr,
//! which keeps stdout free for the run report. Log level can be controlled
//! via the `RUST_LOG` environment variable.
//!
//! # Examples
//!
//! ```bash
//! # Default: info for riskflag, errors only for HTTP dependencies
//! riskflag triage
//!
//! # Include request-level detail from the HTTP stack
//! RUST_LOG=riskflag_core=debug,octocrab=debug riskflag triage
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "riskflag=info,riskflag_core=info,octocrab=error,reqwest=error";
const VERBOSE_FILTER: &str = "riskflag=debug,riskflag_core=debug,octocrab=error,reqwest=error";

/// Returns the filter directives used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` picks between the info
/// and debug defaults.
pub fn init_logging(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
