//! Revert-commit creation for a confirmed failing revision.
//!
//! Two implementations of [`Remediator`]:
//!
//! - [`EchoRemediator`] logs the request it would send and reports
//!   [`RemediationOutcome::Simulated`]. It holds no HTTP client.
//! - [`GitLabRemediator`] POSTs to the GitLab commit revert endpoint once,
//!   with a 10 second timeout. Failures are returned, never retried.

use crate::config::{RevertMode, RollbackConfig};
use crate::error::{Result, RollbackError};
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// Echo mode: nothing was sent.
    Simulated,
    /// GitLab accepted the revert.
    Created,
}

pub trait Remediator: Send + Sync {
    fn remediate<'a>(&'a self, revision: &'a str) -> BoxFuture<'a, Result<RemediationOutcome>>;
}

/// Pick the remediator for the configured mode.
pub fn from_config(config: Arc<RollbackConfig>) -> Result<Arc<dyn Remediator>> {
    Ok(match config.mode {
        RevertMode::Echo => Arc::new(EchoRemediator::new(config)),
        RevertMode::Live => Arc::new(GitLabRemediator::new(config)?),
    })
}

#[derive(Debug, Serialize)]
struct RevertRequest<'a> {
    branch: &'a str,
}

// ---------------------------------------------------------------------------
// EchoRemediator
// ---------------------------------------------------------------------------

pub struct EchoRemediator {
    config: Arc<RollbackConfig>,
}

impl EchoRemediator {
    pub fn new(config: Arc<RollbackConfig>) -> Self {
        Self { config }
    }
}

impl Remediator for EchoRemediator {
    fn remediate<'a>(&'a self, revision: &'a str) -> BoxFuture<'a, Result<RemediationOutcome>> {
        Box::pin(async move {
            let url = self.config.revert_url(revision);
            let branch = self.config.branch_name(revision);
            tracing::info!(%url, %branch, revision, "echo: would POST revert");
            Ok(RemediationOutcome::Simulated)
        })
    }
}

// ---------------------------------------------------------------------------
// GitLabRemediator
// ---------------------------------------------------------------------------

pub struct GitLabRemediator {
    config: Arc<RollbackConfig>,
    http: reqwest::Client,
}

impl GitLabRemediator {
    pub fn new(config: Arc<RollbackConfig>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, http })
    }

    async fn create_revert(&self, revision: &str) -> Result<RemediationOutcome> {
        let url = self.config.revert_url(revision);
        let branch = self.config.branch_name(revision);
        let body = serde_json::to_vec(&RevertRequest { branch: &branch })?;

        let resp = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.config.gitlab.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!(revision, %branch, status = status.as_u16(), "revert commit created");
            return Ok(RemediationOutcome::Created);
        }

        // Best effort: the body only enriches the error message.
        let body = resp.text().await.unwrap_or_default();
        Err(RollbackError::GitLabApi {
            status: status.as_u16(),
            body,
        })
    }
}

impl Remediator for GitLabRemediator {
    fn remediate<'a>(&'a self, revision: &'a str) -> BoxFuture<'a, Result<RemediationOutcome>> {
        Box::pin(self.create_revert(revision))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitLabConfig;
    use mockito::Matcher;

    const REVERT_PATH: &str = "/api/v4/projects/42/repository/commits/abc123/revert";

    fn config_for(server: &mockito::Server, mode: RevertMode) -> Arc<RollbackConfig> {
        Arc::new(RollbackConfig {
            gitlab: GitLabConfig {
                token: "glpat-secret".into(),
                project_id: "42".into(),
                base_url: server.url(),
            },
            mode,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn live_posts_revert_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", REVERT_PATH)
            .match_header("private-token", "glpat-secret")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({ "branch": "revert-abc123" })))
            .with_status(201)
            .with_body(r#"{"id":"def456"}"#)
            .create_async()
            .await;

        let remediator = from_config(config_for(&server, RevertMode::Live)).unwrap();
        let outcome = remediator.remediate("abc123").await.unwrap();

        assert_eq!(outcome, RemediationOutcome::Created);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn live_non_2xx_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", REVERT_PATH)
            .with_status(401)
            .with_body(r#"{"message":"401 Unauthorized"}"#)
            .expect(1)
            .create_async()
            .await;

        let remediator = GitLabRemediator::new(config_for(&server, RevertMode::Live)).unwrap();
        let err = remediator.remediate("abc123").await.unwrap_err();

        match err {
            RollbackError::GitLabApi { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Unauthorized"));
            }
            other => panic!("expected GitLabApi, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn live_transport_error_is_http_error() {
        let config = Arc::new(RollbackConfig {
            gitlab: GitLabConfig {
                token: "t".into(),
                project_id: "42".into(),
                // Port 1 is never listening.
                base_url: "http://127.0.0.1:1".into(),
            },
            ..Default::default()
        });
        let remediator = GitLabRemediator::new(config).unwrap();
        let err = remediator.remediate("abc123").await.unwrap_err();
        assert!(matches!(err, RollbackError::Http(_)));
    }

    #[tokio::test]
    async fn echo_never_touches_the_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let remediator = from_config(config_for(&server, RevertMode::Echo)).unwrap();
        for revision in ["abc123", "def456", "0123abcd"] {
            let outcome = remediator.remediate(revision).await.unwrap();
            assert_eq!(outcome, RemediationOutcome::Simulated);
        }
        mock.assert_async().await;
    }
}
