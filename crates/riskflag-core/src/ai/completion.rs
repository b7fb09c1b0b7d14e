// SPDX-License-Identifier: Apache-2.0

//! Client for a locally hosted text-completion endpoint.
//!
//! Sends `{prompt, stream: false, temperature}` to `{base_url}/completion` and
//! reads the `content` field of the JSON reply. Failed attempts are retried
//! sequentially with a fixed delay; once every attempt has failed the caller
//! gets a [`ModelReply::Failed`] carrying a diagnostic instead of an error.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use backon::Retryable;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::prompt::Prompt;
use crate::config::CompletionConfig;
use crate::error::RiskflagError;
use crate::retry::retry_policy;

/// Request body for the completion endpoint.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    /// Full prompt text.
    pub prompt: &'a str,
    /// Always `false`; the reply is read in one piece.
    pub stream: bool,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Response body from the completion endpoint.
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
}

/// Outcome of a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// The endpoint answered with generated text.
    Completed(String),
    /// Every attempt failed.
    Failed {
        /// Number of attempts made.
        attempts: u32,
        /// Human-readable description of the last failure.
        diagnostic: String,
    },
}

impl ModelReply {
    /// Returns the generated text, or the diagnostic for a failed call.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            ModelReply::Completed(text) => text,
            ModelReply::Failed { diagnostic, .. } => diagnostic,
        }
    }

    /// Returns `true` if every attempt failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, ModelReply::Failed { .. })
    }
}

/// Completion endpoint client.
///
/// Holds the HTTP client and generation parameters for the whole run.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    /// HTTP client.
    http: Client,
    /// Full endpoint URL (`{base_url}/completion`).
    endpoint: String,
    /// Temperature for every request.
    temperature: f32,
    /// Total attempts per call.
    max_attempts: u32,
    /// Fixed delay between attempts.
    retry_delay: Duration,
}

impl CompletionClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &CompletionConfig) -> Result<Self, RiskflagError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/completion", config.base_url.trim_end_matches('/')),
            temperature: config.temperature,
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
        })
    }

    /// Overrides the total number of attempts (minimum 1).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Overrides the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the configured number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sends one request (no retry).
    async fn send_once(&self, prompt: &Prompt) -> Result<String> {
        let request = CompletionRequest {
            prompt: prompt.as_str(),
            stream: false,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("POST {} failed", self.endpoint))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RiskflagError::Completion {
                message: format!(
                    "POST {} returned HTTP {}: {}",
                    self.endpoint,
                    status.as_u16(),
                    body.trim()
                ),
                status: Some(status.as_u16()),
            }
            .into());
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .with_context(|| {
                format!(
                    "Failed to parse completion response from {}",
                    self.endpoint
                )
            })?;
        Ok(completion.content)
    }

    /// Sends the prompt, retrying failed attempts with a fixed delay.
    ///
    /// Never fails: after the last attempt the diagnostic is returned as
    /// [`ModelReply::Failed`].
    #[instrument(
        skip(self, prompt),
        fields(endpoint = %self.endpoint, max_attempts = self.max_attempts)
    )]
    pub async fn complete(&self, prompt: &Prompt) -> ModelReply {
        debug!(prompt_bytes = prompt.as_str().len(), "Sending completion request");
        let attempts = AtomicU32::new(0);
        let start = std::time::Instant::now();

        let result = (|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            self.send_once(prompt).await
        })
        .retry(retry_policy(self.max_attempts, self.retry_delay))
        .notify(|err, delay| {
            warn!(
                attempt = attempts.load(Ordering::SeqCst),
                error = %format!("{err:#}"),
                delay = ?delay,
                "Completion attempt failed, retrying"
            );
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(content) => {
                info!(
                    attempts,
                    duration_ms,
                    reply_bytes = content.len(),
                    "Completion received"
                );
                ModelReply::Completed(content)
            }
            Err(err) => {
                let diagnostic = format!(
                    "Failed to retrieve completion after {attempts} attempt(s): {err:#}"
                );
                warn!(attempts, duration_ms, diagnostic = %diagnostic, "Completion failed");
                ModelReply::Failed {
                    attempts,
                    diagnostic,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client(server: &mockito::Server, max_attempts: u32) -> CompletionClient {
        let config = CompletionConfig {
            base_url: server.url(),
            max_attempts,
            ..CompletionConfig::default()
        };
        CompletionClient::new(&config)
            .unwrap()
            .with_retry_delay(Duration::ZERO)
    }

    fn prompt() -> Prompt {
        Prompt::from_raw("### System Prompt\nClassify.\n")
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = CompletionConfig {
            base_url: "http://llama:8080/".to_string(),
            ..CompletionConfig::default()
        };
        let client = CompletionClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://llama:8080/completion");
        assert_eq!(client.max_attempts(), 3);
    }

    #[tokio::test]
    async fn test_complete_sends_fixed_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/completion")
            .match_body(Matcher::Json(json!({
                "prompt": "### System Prompt\nClassify.\n",
                "stream": false,
                "temperature": 0.0,
            })))
            .with_status(200)
            .with_body(r#"{"content": "BLUE\nLooks good."}"#)
            .expect(1)
            .create_async()
            .await;

        let reply = client(&server, 3).complete(&prompt()).await;

        mock.assert_async().await;
        assert_eq!(reply, ModelReply::Completed("BLUE\nLooks good.".to_string()));
    }

    #[tokio::test]
    async fn test_complete_stops_after_max_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/completion")
            .with_status(503)
            .with_body("model loading")
            .expect(4)
            .create_async()
            .await;

        let reply = client(&server, 4).complete(&prompt()).await;

        mock.assert_async().await;
        match reply {
            ModelReply::Failed {
                attempts,
                diagnostic,
            } => {
                assert_eq!(attempts, 4);
                assert!(diagnostic.contains("after 4 attempt(s)"));
                assert!(diagnostic.contains("HTTP 503"));
                assert!(diagnostic.contains("model loading"));
            }
            ModelReply::Completed(text) => panic!("unexpected completion: {text}"),
        }
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/completion")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let reply = client(&server, 3)
            .with_max_attempts(1)
            .complete(&prompt())
            .await;

        mock.assert_async().await;
        assert!(reply.is_failed());
        assert!(!reply.text().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_becomes_diagnostic() {
        let config = CompletionConfig {
            // Port 9 (discard) on localhost is not expected to accept HTTP.
            base_url: "http://127.0.0.1:9".to_string(),
            max_attempts: 2,
            ..CompletionConfig::default()
        };
        let client = CompletionClient::new(&config)
            .unwrap()
            .with_retry_delay(Duration::ZERO);

        let reply = client.complete(&prompt()).await;

        assert!(reply.is_failed());
        assert!(
            reply
                .text()
                .starts_with("Failed to retrieve completion after 2 attempt(s)")
        );
    }

    #[tokio::test]
    async fn test_missing_content_field_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/completion")
            .with_status(200)
            .with_body(r#"{"text": "wrong field"}"#)
            .expect(1)
            .create_async()
            .await;

        let reply = client(&server, 1).complete(&prompt()).await;

        assert!(reply.is_failed());
        assert!(reply.text().contains("Failed to parse completion response"));
    }
}
