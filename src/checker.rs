//! Account status checking against the authenticated status page
//!
//! The orchestrator only sees the [`StatusChecker`] seam: one opaque
//! credential in, one status label out. The bundled HTTP implementation
//! fetches the status page with the credential as a session cookie, solving a
//! CAPTCHA first when the endpoint is gated, and leaves the page-to-label
//! heuristics to the embedding application via [`PageClassifier`].

use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::solver::{SolverClient, TaskSpec};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-account status check capability consumed by the orchestrator
#[async_trait]
pub trait StatusChecker: Send + Sync {
    /// Resolve `credential` to a status label.
    async fn check(&self, credential: &str) -> Result<String>;
}

/// Maps a fetched status page to a status label
///
/// Classification heuristics belong to the embedding application; this crate
/// defines only the seam. Implementations should return [`Error::Check`] when
/// the page cannot be classified.
pub trait PageClassifier: Send + Sync {
    /// Derive the status label from the page body.
    fn classify(&self, body: &str) -> Result<String>;
}

/// [`StatusChecker`] backed by an authenticated page fetch
pub struct HttpStatusChecker {
    http: reqwest::Client,
    endpoint: EndpointConfig,
    solver: Option<Arc<SolverClient>>,
    classifier: Arc<dyn PageClassifier>,
}

impl HttpStatusChecker {
    /// Build a checker for `endpoint`, classifying pages with `classifier`.
    pub fn new(endpoint: EndpointConfig, classifier: Arc<dyn PageClassifier>) -> Result<Self> {
        endpoint.validate()?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint,
            solver: None,
            classifier,
        })
    }

    /// Gate every page fetch behind a CAPTCHA solve.
    ///
    /// Only takes effect when the endpoint configuration carries a site key.
    #[must_use]
    pub fn with_solver(mut self, solver: Arc<SolverClient>) -> Self {
        self.solver = Some(solver);
        self
    }
}

#[async_trait]
impl StatusChecker for HttpStatusChecker {
    async fn check(&self, credential: &str) -> Result<String> {
        let mut request = self.http.get(&self.endpoint.url).header(
            reqwest::header::COOKIE,
            format!("{}={}", self.endpoint.cookie_name, credential),
        );

        // CAPTCHA-gated endpoints want a fresh token on every fetch
        if let (Some(solver), Some(site_key)) =
            (&self.solver, &self.endpoint.recaptcha_site_key)
        {
            let spec = TaskSpec::recaptcha_v2(&self.endpoint.url, site_key);
            let solution = solver
                .solve(&spec, &CancellationToken::new())
                .await
                .map_err(Error::Solve)?;
            request = request.query(&[("g-recaptcha-response", solution.recaptcha_response()?)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Check(format!("status page returned {status}")));
        }
        let body = response.text().await?;
        self.classifier.classify(&body)
    }
}
