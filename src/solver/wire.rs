//! Wire envelopes for the create/poll task service protocol
//!
//! The service speaks JSON over two POST endpoints. Every response carries an
//! `errorId`; any non-zero value is a terminal failure for the call,
//! regardless of which endpoint produced it.

use crate::error::SolveError;
use crate::solver::TaskSpec;
use crate::types::TaskId;
use serde::{Deserialize, Serialize};

/// `POST /createTask` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskRequest<'a> {
    pub client_key: &'a str,
    pub task: &'a TaskSpec,
}

/// `POST /createTask` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTaskResponse {
    #[serde(default)]
    pub error_id: i64,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
}

impl CreateTaskResponse {
    /// Terminal error carried by the envelope, if any.
    pub(crate) fn error(&self) -> Option<SolveError> {
        envelope_error(self.error_id, &self.error_code, &self.error_description)
    }
}

/// `POST /getTaskResult` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetTaskResultRequest<'a> {
    pub client_key: &'a str,
    pub task_id: &'a TaskId,
}

/// `POST /getTaskResult` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetTaskResultResponse {
    #[serde(default)]
    pub error_id: i64,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub solution: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GetTaskResultResponse {
    /// Terminal error carried by the envelope, if any.
    pub(crate) fn error(&self) -> Option<SolveError> {
        envelope_error(self.error_id, &self.error_code, &self.error_description)
    }
}

fn envelope_error(
    error_id: i64,
    code: &Option<String>,
    description: &Option<String>,
) -> Option<SolveError> {
    (error_id != 0).then(|| SolveError::Remote {
        error_id,
        code: code.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
        description: description
            .clone()
            .unwrap_or_else(|| "no description provided".to_string()),
    })
}
