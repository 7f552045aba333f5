//! Client for an asynchronous create-then-poll task service
//!
//! CAPTCHA solvers work out of band: one HTTP call creates a task, then the
//! caller polls until the service reports a solution or a terminal error.
//! [`SolverClient::solve`] hides that protocol behind a single blocking-style
//! call: the caller hands over a [`TaskSpec`] and gets back a complete
//! [`Solution`] or an error, never interim poll state.
//!
//! # Termination
//!
//! Every solve call terminates in one of four ways:
//! - the poll reports `ready` (success),
//! - any response carries a non-zero error envelope ([`SolveError::Remote`],
//!   never retried),
//! - the configured deadline expires ([`SolveError::Timeout`]),
//! - the caller's cancellation token fires ([`SolveError::Cancelled`]).
//!
//! Cancellation is cooperative: the inter-poll wait races the timer against
//! the token, so cancelling takes effect within one poll interval rather than
//! after a full round-trip.

mod task;
mod wire;

pub use task::{RECAPTCHA_RESPONSE_FIELD, Solution, TaskSpec};

use crate::config::SolverConfig;
use crate::error::{Error, Result, SolveError};
use crate::types::TaskId;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What one poll round-trip concluded
enum PollOutcome {
    /// Solution available
    Ready(Solution),
    /// Task still being worked on
    Pending,
}

/// Client driving the remote task service
///
/// Holds no per-task state: every [`solve`](Self::solve) call is independent,
/// so one client can serve any number of concurrent solves.
pub struct SolverClient {
    http: reqwest::Client,
    create_url: Url,
    result_url: Url,
    client_key: String,
    poll_interval: Duration,
    solve_timeout: Duration,
}

impl SolverClient {
    /// Build a client from configuration.
    ///
    /// Fails with a configuration error if the API URL does not parse.
    pub fn new(config: &SolverConfig) -> Result<Self> {
        let base = config.api_url.trim_end_matches('/');
        let parse = |endpoint: &str| {
            Url::parse(&format!("{base}/{endpoint}")).map_err(|e| Error::Config {
                message: format!("invalid task service URL: {e}"),
                key: Some("solver.api_url".to_string()),
            })
        };
        let create_url = parse("createTask")?;
        let result_url = parse("getTaskResult")?;
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            create_url,
            result_url,
            client_key: config.client_key.clone(),
            poll_interval: config.poll_interval,
            solve_timeout: config.solve_timeout,
        })
    }

    /// Solve `spec`, blocking until a solution or a terminal failure.
    ///
    /// The configured solve timeout bounds the whole call, submission
    /// included. `cancel` stops the call early; a caller that never cancels
    /// can pass a fresh token. No partial result is ever returned.
    pub async fn solve(
        &self,
        spec: &TaskSpec,
        cancel: &CancellationToken,
    ) -> std::result::Result<Solution, SolveError> {
        match tokio::time::timeout(self.solve_timeout, self.solve_inner(spec, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    kind = spec.kind(),
                    timeout = ?self.solve_timeout,
                    "solve deadline expired before the task reached a terminal state"
                );
                Err(SolveError::Timeout)
            }
        }
    }

    async fn solve_inner(
        &self,
        spec: &TaskSpec,
        cancel: &CancellationToken,
    ) -> std::result::Result<Solution, SolveError> {
        let task_id = self.create_task(spec).await?;
        tracing::debug!(task_id = %task_id, kind = spec.kind(), "task created, polling for solution");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {
                    tracing::debug!(task_id = %task_id, "solve cancelled while waiting to poll");
                    return Err(SolveError::Cancelled);
                }
            }

            match self.fetch_result(&task_id).await? {
                PollOutcome::Ready(solution) => {
                    tracing::debug!(task_id = %task_id, "task solved");
                    return Ok(solution);
                }
                PollOutcome::Pending => {
                    tracing::trace!(task_id = %task_id, "task still processing");
                }
            }
        }
    }

    /// Submit the task. A non-zero error envelope is terminal; no retry.
    async fn create_task(&self, spec: &TaskSpec) -> std::result::Result<TaskId, SolveError> {
        let body = wire::CreateTaskRequest {
            client_key: &self.client_key,
            task: spec,
        };
        let response: wire::CreateTaskResponse = self
            .http
            .post(self.create_url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error() {
            return Err(err);
        }
        response.task_id.ok_or_else(|| {
            SolveError::Malformed("create response carried neither an error nor a task id".into())
        })
    }

    async fn fetch_result(
        &self,
        task_id: &TaskId,
    ) -> std::result::Result<PollOutcome, SolveError> {
        let body = wire::GetTaskResultRequest {
            client_key: &self.client_key,
            task_id,
        };
        let response: wire::GetTaskResultResponse = self
            .http
            .post(self.result_url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error() {
            return Err(err);
        }
        match response.status.as_deref() {
            Some("ready") => {
                let fields = response.solution.ok_or_else(|| {
                    SolveError::Malformed("ready response carried no solution".into())
                })?;
                Ok(PollOutcome::Ready(Solution::new(fields)))
            }
            // The service reports queued work under a few names depending on age
            Some("processing" | "pending" | "created") => Ok(PollOutcome::Pending),
            Some(other) => Err(SolveError::Malformed(format!(
                "unknown task status `{other}`"
            ))),
            None => Err(SolveError::Malformed(
                "result response carried no status".into(),
            )),
        }
    }
}
