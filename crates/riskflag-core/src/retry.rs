// SPDX-License-Identifier: Apache-2.0

//! Retry policy for the completion endpoint.
//!
//! Attempts are strictly sequential and separated by a fixed delay; there is
//! no backoff growth and no jitter.

use std::time::Duration;

use backon::ConstantBuilder;

/// Creates a constant-delay retry builder allowing `max_attempts` total attempts.
///
/// `max_attempts` of 0 or 1 both mean a single attempt with no retry.
#[must_use]
pub fn retry_policy(max_attempts: u32, delay: Duration) -> ConstantBuilder {
    let retries = max_attempts.saturating_sub(1) as usize;
    ConstantBuilder::default()
        .with_delay(delay)
        .with_max_times(retries)
}
