// SPDX-License-Identifier: Apache-2.0

//! Pipeline runner.
//!
//! Both variants share the metadata fetcher, prompt builder and completion
//! client. Triage additionally manages category labels and interprets the
//! reply; summary posts the reply as-is after a single completion attempt.
//!
//! Once a [`Pipeline`] is built nothing in a run returns an error: every
//! failure is collected on the [`RunReport`], and [`RunReport::status`]
//! decides whether it is worth a non-zero exit code.

use std::fmt;

use octocrab::Octocrab;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::ai::{CompletionClient, ModelReply, SystemPrompt, build_prompt};
use crate::auth::TokenProvider;
use crate::config::AppConfig;
use crate::error::RiskflagError;
use crate::github::metadata::{FetchFailure, fetch_context};
use crate::github::publish::{attach_label, ensure_labels, post_comment};
use crate::github::{PrTarget, build_client};
use crate::interpret::{Category, interpret};
use crate::soft::Soft;

/// Which pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Classify the diff into a risk category, label the PR and comment.
    Triage,
    /// Summarize the PR description and commits into a comment.
    Summary,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Triage => f.write_str("triage"),
            Variant::Summary => f.write_str("summary"),
        }
    }
}

/// Overall outcome of a run, ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Completed; write failures, if any, were tolerated.
    Success,
    /// The variant's primary input could not be fetched.
    UpstreamFetchFailure,
    /// Every completion attempt failed.
    CompletionFailure,
}

impl RunStatus {
    /// Process exit code for this status.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::UpstreamFetchFailure => 3,
            RunStatus::CompletionFailure => 4,
        }
    }
}

/// Everything that happened during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Variant that ran.
    pub variant: Variant,
    /// Pull request the run operated on.
    pub target: PrTarget,
    /// Resolved category (triage only).
    pub category: Option<Category>,
    /// Comment text that was (or, in dry-run, would have been) posted.
    pub comment: String,
    /// Labels created on the repository during this run.
    pub labels_created: Vec<Category>,
    /// Whether the category label was attached to the PR.
    pub label_attached: bool,
    /// Whether the comment was posted.
    pub comment_posted: bool,
    /// URL of the posted comment, when GitHub returned one.
    pub comment_url: Option<String>,
    /// Whether comment posting was suppressed.
    pub dry_run: bool,
    /// Metadata reads that failed.
    pub fetch_failures: Vec<FetchFailure>,
    /// Label or comment writes that failed.
    pub write_failures: Vec<String>,
    /// Diagnostic when every completion attempt failed.
    pub completion_failure: Option<String>,
    /// Whether the variant's primary input (diff or PR detail) was missing.
    pub primary_input_missing: bool,
}

impl RunReport {
    fn new(variant: Variant, target: PrTarget, dry_run: bool) -> Self {
        Self {
            variant,
            target,
            category: None,
            comment: String::new(),
            labels_created: Vec::new(),
            label_attached: false,
            comment_posted: false,
            comment_url: None,
            dry_run,
            fetch_failures: Vec::new(),
            write_failures: Vec::new(),
            completion_failure: None,
            primary_input_missing: false,
        }
    }

    /// Classifies the run. A missing primary input outranks a completion
    /// failure, since the latter usually follows from the former.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.primary_input_missing {
            RunStatus::UpstreamFetchFailure
        } else if self.completion_failure.is_some() {
            RunStatus::CompletionFailure
        } else {
            RunStatus::Success
        }
    }

    /// Shorthand for `self.status().exit_code()`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.status().exit_code()
    }

    fn record_write<T>(&mut self, soft: Soft<T>) -> Option<T> {
        match soft {
            Soft::Ok(value) => Some(value),
            Soft::Failed {
                operation,
                diagnostic,
            } => {
                self.write_failures.push(format!("{operation}: {diagnostic}"));
                None
            }
        }
    }
}

/// A configured pipeline, ready to run against any pull request.
#[derive(Debug, Clone)]
pub struct Pipeline {
    github: Octocrab,
    completion: CompletionClient,
    system_prompt: SystemPrompt,
    config: AppConfig,
}

impl Pipeline {
    /// Assembles a pipeline from already built parts.
    #[must_use]
    pub fn new(
        github: Octocrab,
        completion: CompletionClient,
        system_prompt: SystemPrompt,
        config: AppConfig,
    ) -> Self {
        Self {
            github,
            completion,
            system_prompt,
            config,
        }
    }

    /// Builds every client from configuration.
    ///
    /// This is where fatal setup problems surface: a missing token, an
    /// unreadable system prompt, or a client that cannot be constructed.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `SystemPrompt`, `GitHub` or `Network`.
    pub fn from_config(
        config: AppConfig,
        tokens: &dyn TokenProvider,
    ) -> Result<Self, RiskflagError> {
        let token = tokens
            .github_token()
            .ok_or(RiskflagError::NotAuthenticated)?;
        let system_prompt = SystemPrompt::load(&config.prompt.system_prompt_path)?;
        let github = build_client(&config.github.api_url, &token)
            .map_err(|e| RiskflagError::GitHub {
                message: format!("{e:#}"),
            })?;
        let completion = CompletionClient::new(&config.completion)?;
        Ok(Self::new(github, completion, system_prompt, config))
    }

    /// Runs one variant against `target`.
    #[instrument(
        skip(self),
        fields(target = %target, variant = %variant, dry_run = self.config.review.dry_run)
    )]
    pub async fn run(&self, target: &PrTarget, variant: Variant) -> RunReport {
        let mut report = RunReport::new(variant, target.clone(), self.config.review.dry_run);

        if variant == Variant::Triage {
            let sync = ensure_labels(&self.github, target, &Category::ALL).await;
            if let Some(sync) = report.record_write(sync) {
                report.labels_created = sync.created;
                report.write_failures.extend(sync.failures);
            }
        }

        let context = fetch_context(&self.github, target, &self.config.github, variant).await;
        report.primary_input_missing = context.primary_input_missing(variant);
        if report.primary_input_missing {
            warn!("Primary input missing, continuing with partial context");
        }
        report.fetch_failures.clone_from(&context.failures);

        let prompt = build_prompt(&self.system_prompt, &context, variant);
        let reply = match variant {
            Variant::Triage => self.completion.complete(&prompt).await,
            Variant::Summary => {
                self.completion
                    .clone()
                    .with_max_attempts(1)
                    .complete(&prompt)
                    .await
            }
        };

        let comment = match reply {
            ModelReply::Completed(text) => match variant {
                Variant::Triage => {
                    let interpretation = interpret(&text);
                    report.category = interpretation.category;
                    Some(interpretation.comment)
                }
                Variant::Summary => Some(text),
            },
            ModelReply::Failed { diagnostic, .. } => {
                report.completion_failure = Some(diagnostic.clone());
                self.config
                    .review
                    .post_completion_failures
                    .then_some(diagnostic)
            }
        };

        match report.category {
            Some(category) => {
                let attached = attach_label(&self.github, target, category).await;
                report.label_attached = report.record_write(attached).is_some();
            }
            None if variant == Variant::Triage => {
                info!("No category found in reply, posting as unclassified comment");
            }
            None => {}
        }

        if let Some(comment) = comment {
            report.comment = comment;
            self.publish_comment(target, &mut report).await;
        }

        info!(
            status = ?report.status(),
            category = report.category.map_or("-", Category::as_str),
            comment_posted = report.comment_posted,
            fetch_failures = report.fetch_failures.len(),
            write_failures = report.write_failures.len(),
            "Run finished"
        );
        report
    }

    async fn publish_comment(&self, target: &PrTarget, report: &mut RunReport) {
        if report.comment.trim().is_empty() {
            warn!("Comment is empty, not posting");
            return;
        }
        if report.dry_run {
            info!(comment = %report.comment, "Dry run, comment not posted");
            return;
        }
        let posted = post_comment(&self.github, target, &report.comment).await;
        if let Some(url) = report.record_write(posted) {
            report.comment_posted = true;
            report.comment_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use mockito::{Matcher, Mock, Server};
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::auth::StaticTokenProvider;

    const ALL_LABELS: &str = r#"[{"name": "BLUE"}, {"name": "RED"}, {"name": "BLACK"}]"#;

    fn target() -> PrTarget {
        PrTarget::new("octocat", "hello", 7).unwrap()
    }

    fn config(server: &Server, dry_run: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.github.api_url = server.url();
        config.github.rules_override = Some("Keep PRs small.".to_string());
        config.completion.base_url = server.url();
        config.completion.max_attempts = 3;
        config.review.dry_run = dry_run;
        config
    }

    fn pipeline(server: &Server, config: AppConfig) -> Pipeline {
        let github =
            build_client(&server.url(), &SecretString::from("test-token")).unwrap();
        let completion = CompletionClient::new(&config.completion)
            .unwrap()
            .with_retry_delay(Duration::ZERO);
        Pipeline::new(
            github,
            completion,
            SystemPrompt::from("Classify the PR."),
            config,
        )
    }

    /// Mocks every GitHub read a triage run performs, each expected once.
    async fn mock_triage_reads(server: &mut Server) -> Vec<Mock> {
        vec![
            server
                .mock("GET", "/repos/octocat/hello/labels")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(ALL_LABELS)
                .expect(1)
                .create_async()
                .await,
            server
                .mock("GET", "/repos/octocat/hello")
                .with_status(200)
                .with_body(r#"{"description": "Greeting service"}"#)
                .expect(1)
                .create_async()
                .await,
            server
                .mock("GET", "/repos/octocat/hello/pulls/7")
                .match_header("accept", Matcher::Regex("json".to_string()))
                .with_status(200)
                .with_body(r#"{"title": "Add retries", "body": "Retries the flaky call."}"#)
                .expect(1)
                .create_async()
                .await,
            server
                .mock("GET", "/repos/octocat/hello/pulls/7")
                .match_header("accept", Matcher::Regex("diff".to_string()))
                .with_status(200)
                .with_body("diff --git a/x b/x\n+retry()\n")
                .expect(1)
                .create_async()
                .await,
        ]
    }

    async fn mock_completion(server: &mut Server, content: &str) -> Mock {
        server
            .mock("POST", "/completion")
            .with_status(200)
            .with_body(json!({ "content": content }).to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_triage_blue_reply_labels_and_comments() {
        let mut server = Server::new_async().await;
        mock_triage_reads(&mut server).await;
        let completion = mock_completion(&mut server, "BLUE\nLooks good, minor nits.").await;
        let label = server
            .mock("POST", "/repos/octocat/hello/issues/7/labels")
            .match_body(Matcher::Json(json!({ "labels": ["BLUE"] })))
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/repos/octocat/hello/issues/7/comments")
            .match_body(Matcher::Json(json!({ "body": "Looks good, minor nits." })))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Triage)
            .await;

        completion.assert_async().await;
        label.assert_async().await;
        comment.assert_async().await;
        assert_eq!(report.category, Some(Category::Blue));
        assert_eq!(report.comment, "Looks good, minor nits.");
        assert!(report.label_attached);
        assert!(report.comment_posted);
        assert!(report.write_failures.is_empty());
        assert_eq!(report.status(), RunStatus::Success);
    }

    #[tokio::test]
    async fn test_triage_unclassified_reply_posts_full_text() {
        let reply = "This PR touches auth and payments, recommend senior review.";
        let mut server = Server::new_async().await;
        mock_triage_reads(&mut server).await;
        mock_completion(&mut server, reply).await;
        let label = server
            .mock("POST", "/repos/octocat/hello/issues/7/labels")
            .expect(0)
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/repos/octocat/hello/issues/7/comments")
            .match_body(Matcher::Json(json!({ "body": reply })))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Triage)
            .await;

        label.assert_async().await;
        comment.assert_async().await;
        assert_eq!(report.category, None);
        assert_eq!(report.comment, reply);
        assert!(!report.label_attached);
        assert_eq!(report.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_never_posts_comment() {
        let mut server = Server::new_async().await;
        let reads = mock_triage_reads(&mut server).await;
        let completion = mock_completion(&mut server, "RED\nTouches the scheduler.").await;
        server
            .mock("POST", "/repos/octocat/hello/issues/7/labels")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/repos/octocat/hello/issues/7/comments")
            .expect(0)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, true))
            .run(&target(), Variant::Triage)
            .await;

        for read in &reads {
            read.assert_async().await;
        }
        completion.assert_async().await;
        comment.assert_async().await;
        assert!(report.dry_run);
        assert!(!report.comment_posted);
        assert_eq!(report.comment, "Touches the scheduler.");
        assert_eq!(report.category, Some(Category::Red));
    }

    #[tokio::test]
    async fn test_completion_failure_posts_diagnostic_and_reports() {
        let mut server = Server::new_async().await;
        mock_triage_reads(&mut server).await;
        let completion = server
            .mock("POST", "/completion")
            .with_status(503)
            .with_body("model loading")
            .expect(3)
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/repos/octocat/hello/issues/7/comments")
            .match_body(Matcher::Regex("Failed to retrieve completion after 3".to_string()))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Triage)
            .await;

        completion.assert_async().await;
        comment.assert_async().await;
        assert_eq!(report.category, None);
        assert!(report.completion_failure.is_some());
        assert_eq!(report.status(), RunStatus::CompletionFailure);
        assert_eq!(report.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_missing_diff_is_upstream_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/octocat/hello/labels")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(ALL_LABELS)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello")
            .with_status(200)
            .with_body(r#"{"description": null}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello/pulls/7")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;
        mock_completion(&mut server, "BLACK\nCannot judge without a diff.").await;
        server
            .mock(
                "POST",
                Matcher::Regex("^/repos/octocat/hello/issues/7/".to_string()),
            )
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Triage)
            .await;

        assert!(report.primary_input_missing);
        assert_eq!(report.fetch_failures.len(), 2);
        assert_eq!(report.status(), RunStatus::UpstreamFetchFailure);
        assert_eq!(report.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_summary_single_attempt_and_no_labels() {
        let mut server = Server::new_async().await;
        let labels = server
            .mock("GET", "/repos/octocat/hello/labels")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello")
            .with_status(200)
            .with_body(r#"{"description": "Greeting service"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello/pulls/7")
            .with_status(200)
            .with_body(r#"{"title": "Refactor", "body": "Splits the parser."}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello/pulls/7/commits")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"commit": {"message": "refactor: split parser"}}]"#)
            .create_async()
            .await;
        let completion = server
            .mock("POST", "/completion")
            .match_body(Matcher::Regex("refactor: split parser".to_string()))
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let mut config = config(&server, true);
        config.review.post_completion_failures = false;
        let report = pipeline(&server, config)
            .run(&target(), Variant::Summary)
            .await;

        labels.assert_async().await;
        completion.assert_async().await;
        assert_eq!(report.variant, Variant::Summary);
        assert!(report.comment.is_empty());
        assert!(!report.comment_posted);
        assert_eq!(report.status(), RunStatus::CompletionFailure);
    }

    #[tokio::test]
    async fn test_summary_posts_reply_verbatim_without_label() {
        let reply = "BLUE\nSplits the parser into lexer and grammar modules.";
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/octocat/hello")
            .with_status(200)
            .with_body(r#"{"description": "Greeting service"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello/pulls/7")
            .with_status(200)
            .with_body(r#"{"title": "Refactor", "body": "Splits the parser."}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octocat/hello/pulls/7/commits")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"commit": {"message": "refactor: split parser"}}]"#)
            .create_async()
            .await;
        let completion = mock_completion(&mut server, reply).await;
        let label = server
            .mock("POST", "/repos/octocat/hello/issues/7/labels")
            .expect(0)
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/repos/octocat/hello/issues/7/comments")
            .match_body(Matcher::Json(json!({ "body": reply })))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Summary)
            .await;

        completion.assert_async().await;
        label.assert_async().await;
        comment.assert_async().await;
        assert_eq!(report.category, None);
        assert_eq!(report.comment, reply);
        assert!(!report.label_attached);
        assert!(report.comment_posted);
        assert_eq!(report.status(), RunStatus::Success);
    }

    #[tokio::test]
    async fn test_empty_comment_is_not_posted() {
        let mut server = Server::new_async().await;
        mock_triage_reads(&mut server).await;
        mock_completion(&mut server, "BLUE\n").await;
        server
            .mock("POST", "/repos/octocat/hello/issues/7/labels")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let comment = server
            .mock("POST", "/repos/octocat/hello/issues/7/comments")
            .expect(0)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Triage)
            .await;

        comment.assert_async().await;
        assert!(report.label_attached);
        assert!(!report.comment_posted);
    }

    #[tokio::test]
    async fn test_write_failures_do_not_change_status() {
        let mut server = Server::new_async().await;
        mock_triage_reads(&mut server).await;
        mock_completion(&mut server, "RED\nBig change.").await;
        server
            .mock(
                "POST",
                Matcher::Regex("^/repos/octocat/hello/issues/7/".to_string()),
            )
            .with_status(403)
            .with_body(r#"{"message": "Resource not accessible by integration"}"#)
            .create_async()
            .await;

        let report = pipeline(&server, config(&server, false))
            .run(&target(), Variant::Triage)
            .await;

        assert_eq!(report.write_failures.len(), 2);
        assert!(!report.label_attached);
        assert!(!report.comment_posted);
        assert_eq!(report.status(), RunStatus::Success);
    }

    #[test]
    fn test_from_config_requires_token() {
        let err = Pipeline::from_config(AppConfig::default(), &StaticTokenProvider::new(None))
            .unwrap_err();
        assert!(matches!(err, RiskflagError::NotAuthenticated));
    }

    #[test]
    fn test_from_config_requires_system_prompt() {
        let mut config = AppConfig::default();
        config.prompt.system_prompt_path = "/nonexistent/system_prompt.txt".into();
        let tokens = StaticTokenProvider::new(Some("ghp_test".to_string()));
        let err = Pipeline::from_config(config, &tokens).unwrap_err();
        assert!(matches!(err, RiskflagError::SystemPrompt { .. }));
    }

    #[tokio::test]
    async fn test_from_config_builds_pipeline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Classify.").unwrap();
        let mut config = AppConfig::default();
        config.prompt.system_prompt_path = file.path().to_path_buf();
        let tokens = StaticTokenProvider::new(Some("ghp_test".to_string()));
        assert!(Pipeline::from_config(config, &tokens).is_ok());
    }

    #[test]
    fn test_variant_display_and_exit_codes() {
        assert_eq!(Variant::Triage.to_string(), "triage");
        assert_eq!(Variant::Summary.to_string(), "summary");
        assert_eq!(RunStatus::Success.exit_code(), 0);
        assert_eq!(RunStatus::UpstreamFetchFailure.exit_code(), 3);
        assert_eq!(RunStatus::CompletionFailure.exit_code(), 4);
    }
}
