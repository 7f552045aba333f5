//! Core types for banwatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier the task service assigns to one submitted work item
///
/// Treated as opaque text end to end. The service happens to reply with a
/// JSON number today; the deserializer accepts either form so a service-side
/// change does not break the protocol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a TaskId from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(TaskId(s)),
            serde_json::Value::Number(n) => Ok(TaskId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "task id must be a string or number, got {other}"
            ))),
        }
    }
}

/// Read-only view of one account to check within a sweep
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckTarget {
    /// Display label, unique within the caller's account set for one run
    pub title: String,

    /// Opaque session credential; never interpreted by this crate
    pub credential: String,

    /// Credential already known to be dead (e.g., previously detected
    /// expired cookie); short-circuits the remote check
    pub known_invalid: bool,
}

impl CheckTarget {
    /// Target with a live credential.
    pub fn new(title: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            credential: credential.into(),
            known_invalid: false,
        }
    }

    /// Mark the credential as already known to be dead.
    #[must_use]
    pub fn known_invalid(mut self) -> Self {
        self.known_invalid = true;
        self
    }
}

/// What one account's check concluded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Status label reported for the account
    Status(String),

    /// The session credential is dead; no status could be read
    InvalidCredential,

    /// The check itself failed; other accounts in the sweep are unaffected
    CheckError(String),
}

impl CheckOutcome {
    /// Label worth persisting as the account's last-known status, if any.
    ///
    /// A transient check failure teaches nothing durable about the account,
    /// so it maps to `None`.
    pub fn stored_label(&self) -> Option<&str> {
        match self {
            CheckOutcome::Status(label) => Some(label),
            CheckOutcome::InvalidCredential => Some("invalid credential"),
            CheckOutcome::CheckError(_) => None,
        }
    }
}

/// One account's result within a sweep
///
/// Immutable once produced; the batching stage groups results but never
/// rewrites them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Display label echoed from the input target
    pub title: String,

    /// What the check concluded
    pub outcome: CheckOutcome,

    /// When the check completed
    pub checked_at: DateTime<Utc>,
}
