//! Deploy-preview verification.
//!
//! After a deploy-preview build, runs the end-to-end test suite against the
//! preview URL and reports the outcome as a commit status.
//!
//! ## Gate
//!
//! All environment lookups happen once, in [`DeployGate::from_lookup`]:
//!
//! | Condition | Result |
//! |-----------|--------|
//! | `CONTEXT` unset or not `deploy-preview` | skip |
//! | `DEPLOY_PRIME_URL` unset | skip |
//! | any credential unset | [`DeployError::MissingCredentials`] naming all of them |
//! | otherwise | a validated [`DeployConfig`] |
//!
//! ## Run
//!
//! ```text
//! GET  {test_api}/suites/{suite}/execute/?apiKey=..&startUrl={deploy_url}
//!      → { "data": [ { "name": .., "passing": true|false|null }, .. ] }
//! POST {status_api}/repos/{owner}/{repo}/statuses/{sha}
//!      { state, description, context, target_url }
//! ```
//!
//! A test passes only when `passing` is exactly `true`. There are no retries:
//! one failed request fails the step.

use crate::config::DeployTarget;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const ENV_CONTEXT: &str = "CONTEXT";
pub const ENV_DEPLOY_URL: &str = "DEPLOY_PRIME_URL";
pub const ENV_API_KEY: &str = "GHOST_INSPECTOR_API_KEY";
pub const ENV_SUITE_ID: &str = "GHOST_INSPECTOR_SUITE";
pub const ENV_STATUS_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_COMMIT_REF: &str = "COMMIT_REF";

const PREVIEW_CONTEXT: &str = "deploy-preview";
const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Bad response from {service} (HTTP {status})")]
    BadResponse { service: &'static str, status: u16 },
    #[error("End-to-end tests failed: {}", .failing.join(", "))]
    TestsFailed { failing: Vec<String> },
}

/// Which part of the pipeline a failure takes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only the verification step fails.
    Plugin,
    /// The deploy is marked broken.
    Build,
}

impl DeployError {
    pub fn severity(&self) -> Severity {
        match self {
            DeployError::MissingCredentials(_) | DeployError::Http(_) => Severity::Plugin,
            DeployError::BadResponse { .. } | DeployError::TestsFailed { .. } => Severity::Build,
        }
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        DeployError::Http(err.to_string())
    }
}

/// Everything a verification run needs, validated up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub deploy_url: String,
    pub api_key: String,
    pub suite_id: String,
    pub status_token: String,
    pub commit_sha: String,
}

/// Outcome of reading the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployGate {
    Skip(String),
    Run(DeployConfig),
}

impl DeployGate {
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the gate from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DeployError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match get(ENV_CONTEXT) {
            None => return Ok(DeployGate::Skip("No context".to_string())),
            Some(ctx) if ctx != PREVIEW_CONTEXT => {
                return Ok(DeployGate::Skip(format!("Not in {PREVIEW_CONTEXT} ({ctx})")));
            }
            Some(_) => {}
        }
        let Some(deploy_url) = get(ENV_DEPLOY_URL) else {
            return Ok(DeployGate::Skip("No deploy URL".to_string()));
        };

        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };
        let api_key = require(ENV_API_KEY);
        let suite_id = require(ENV_SUITE_ID);
        let status_token = require(ENV_STATUS_TOKEN);
        let commit_sha = require(ENV_COMMIT_REF);
        if !missing.is_empty() {
            return Err(DeployError::MissingCredentials(missing));
        }

        Ok(DeployGate::Run(DeployConfig {
            deploy_url,
            api_key,
            suite_id,
            status_token,
            commit_sha,
        }))
    }
}

// ============================================================================
// Test runner
// ============================================================================

/// Result of one end-to-end test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    /// `None` while a test is still running or was never run.
    #[serde(default)]
    pub passing: Option<bool>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.passing == Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SuiteRun {
    #[serde(default)]
    pub data: Vec<TestResult>,
}

impl SuiteRun {
    pub fn failing(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|t| !t.passed())
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Triggers a suite run and waits for its results.
pub trait TestRunner {
    fn execute(&self, suite_id: &str, api_key: &str, start_url: &str)
    -> Result<SuiteRun, DeployError>;
}

/// Ghost Inspector suite API.
pub struct GhostInspector {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl GhostInspector {
    pub fn new(target: &DeployTarget) -> Result<Self, DeployError> {
        Ok(Self {
            client: http_client(target)?,
            base_url: target.test_api.trim_end_matches('/').to_string(),
        })
    }
}

impl TestRunner for GhostInspector {
    fn execute(
        &self,
        suite_id: &str,
        api_key: &str,
        start_url: &str,
    ) -> Result<SuiteRun, DeployError> {
        let url = format!("{}/suites/{}/execute/", self.base_url, suite_id);
        tracing::debug!(%url, %start_url, "executing test suite");
        let res = self
            .client
            .get(&url)
            .query(&[("apiKey", api_key), ("startUrl", start_url)])
            .send()?;
        let status = res.status();
        if status.as_u16() >= 400 {
            return Err(DeployError::BadResponse {
                service: "test-suite server",
                status: status.as_u16(),
            });
        }
        Ok(res.json()?)
    }
}

// ============================================================================
// Commit status reporter
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Success,
    Failure,
    Error,
}

/// Body of a commit status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitStatus {
    pub state: StatusState,
    pub description: String,
    pub context: String,
    pub target_url: String,
}

impl CommitStatus {
    pub fn new(state: StatusState, context: &str, target_url: &str) -> Self {
        let description = match state {
            StatusState::Success => "Tests passed!",
            StatusState::Failure => "Tests failed",
            StatusState::Error => "Tests could not run",
        };
        Self {
            state,
            description: description.to_string(),
            context: context.to_string(),
            target_url: target_url.to_string(),
        }
    }
}

pub trait StatusReporter {
    fn set_status(&self, sha: &str, token: &str, status: &CommitStatus)
    -> Result<(), DeployError>;
}

/// GitHub commit status API.
pub struct GithubStatuses {
    client: reqwest::blocking::Client,
    base_url: String,
    owner: String,
    repo: String,
}

impl GithubStatuses {
    pub fn new(target: &DeployTarget) -> Result<Self, DeployError> {
        Ok(Self {
            client: http_client(target)?,
            base_url: target.status_api.trim_end_matches('/').to_string(),
            owner: target.owner.clone(),
            repo: target.repo.clone(),
        })
    }
}

impl StatusReporter for GithubStatuses {
    fn set_status(
        &self,
        sha: &str,
        token: &str,
        status: &CommitStatus,
    ) -> Result<(), DeployError> {
        let url = format!(
            "{}/repos/{}/{}/statuses/{}",
            self.base_url, self.owner, self.repo, sha
        );
        tracing::debug!(%url, state = ?status.state, "setting commit status");
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(status)
            .send()?;
        if !res.status().is_success() {
            return Err(DeployError::BadResponse {
                service: "commit status API",
                status: res.status().as_u16(),
            });
        }
        Ok(())
    }
}

fn http_client(target: &DeployTarget) -> Result<reqwest::blocking::Client, DeployError> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(target.timeout_secs))
        .user_agent(USER_AGENT)
        .build()?)
}

// ============================================================================
// Verification
// ============================================================================

/// Summary of a passing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub title: String,
    pub summary: String,
    pub deploy_url: String,
    pub tests: Vec<TestResult>,
}

/// Run the suite against the preview and report the result.
///
/// On a failing test the commit status is set to `failure` and
/// [`DeployError::TestsFailed`] is returned whether or not that report lands. When the suite cannot run at all,
/// an `error` status is attempted and the runner's error is returned even if
/// that report fails too.
pub fn verify_deploy(
    config: &DeployConfig,
    target: &DeployTarget,
    runner: &dyn TestRunner,
    reporter: &dyn StatusReporter,
) -> Result<DeployReport, DeployError> {
    tracing::info!(url = %config.deploy_url, "starting end-to-end tests");
    let report = |state| {
        reporter.set_status(
            &config.commit_sha,
            &config.status_token,
            &CommitStatus::new(state, &target.status_context, &config.deploy_url),
        )
    };

    let run = match runner.execute(&config.suite_id, &config.api_key, &config.deploy_url) {
        Ok(run) => run,
        Err(err) => {
            if let Err(status_err) = report(StatusState::Error) {
                tracing::warn!(error = %status_err, "could not report error status");
            }
            return Err(err);
        }
    };

    let failing = run.failing();
    if !failing.is_empty() {
        if let Err(status_err) = report(StatusState::Failure) {
            tracing::warn!(error = %status_err, "could not report failure status");
        }
        return Err(DeployError::TestsFailed { failing });
    }

    report(StatusState::Success)?;
    Ok(DeployReport {
        title: target.status_context.clone(),
        summary: "All tests passed".to_string(),
        deploy_url: config.deploy_url.clone(),
        tests: run.data,
    })
}
