//! Task specifications and solved artifacts

use crate::error::SolveError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Solution field carrying the solved reCAPTCHA token
pub const RECAPTCHA_RESPONSE_FIELD: &str = "gRecaptchaResponse";

/// One unit of work submitted to the task service
///
/// Parameters are fixed at construction and sent verbatim with the creation
/// request; progress comes back exclusively through poll responses. Each task
/// kind has a documented, closed parameter set: [`recaptcha_v2`](Self::recaptcha_v2)
/// fills in the reCAPTCHA v2 set, and [`with_param`](Self::with_param) covers
/// service extras such as proxy policy.
#[derive(Clone, Debug, Serialize)]
pub struct TaskSpec {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    parameters: Map<String, Value>,
}

impl TaskSpec {
    /// Task of an arbitrary `kind` with no parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: Map::new(),
        }
    }

    /// reCAPTCHA v2 challenge for `website_url` guarded by `website_key`.
    ///
    /// Parameters: `websiteURL`, `websiteKey`. Expected solution field:
    /// [`RECAPTCHA_RESPONSE_FIELD`].
    pub fn recaptcha_v2(website_url: &str, website_key: &str) -> Self {
        Self::new("ReCaptchaV2")
            .with_param("websiteURL", website_url)
            .with_param("websiteKey", website_key)
    }

    /// Attach an extra parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Task type tag (e.g., "ReCaptchaV2").
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Look up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

/// Solved artifact returned by the task service
///
/// A solution is complete by construction (the client only builds one from a
/// `ready` poll response), but individual fields are validated at access time
/// because the expected key set depends on the task kind.
#[derive(Clone, Debug)]
pub struct Solution {
    fields: Map<String, Value>,
}

impl Solution {
    pub(crate) fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw access to a solution field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A required text field; absent or non-string values are a terminal
    /// solve failure, distinct from a timeout.
    pub fn text(&self, name: &str) -> Result<&str, SolveError> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| SolveError::MissingField {
                field: name.to_string(),
            })
    }

    /// The solved reCAPTCHA token.
    pub fn recaptcha_response(&self) -> Result<&str, SolveError> {
        self.text(RECAPTCHA_RESPONSE_FIELD)
    }
}
