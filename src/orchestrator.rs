//! Rate-limited, batched status-check orchestration
//!
//! One run fans a single user request out across every account that user
//! owns: gate on the actor's cooldown, check each account sequentially,
//! isolate per-account failures, persist each outcome, and deliver results in
//! provider-sized batches.
//!
//! Per-target checks are sequential by design. The remote status check (and
//! any CAPTCHA solve behind it) is the expensive, externally rate-limited
//! resource; sequencing bounds the load on those services and keeps failure
//! isolation trivial.

use crate::checker::StatusChecker;
use crate::config::CheckConfig;
use crate::cooldown::{Acquire, CooldownGate};
use crate::error::{Error, Result};
use crate::types::{CheckOutcome, CheckResult, CheckTarget};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Persistence seam: records each account's latest observed status
///
/// Failures here are logged and never alter an already-computed result; the
/// user sees the right outcome even when it could not be durably recorded.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Record `status` for the account labelled `title`.
    async fn save(&self, title: &str, status: &str, checked_at: DateTime<Utc>) -> Result<()>;
}

/// Delivery seam: receives result batches in input order
///
/// One batch's delivery failure is logged and does not cancel the remaining
/// batches.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Deliver one batch of at most the configured batch size.
    async fn deliver(&self, batch: Vec<CheckResult>) -> Result<()>;
}

/// Fans one actor's request across their accounts under a cooldown
pub struct CheckOrchestrator {
    gate: Arc<CooldownGate>,
    batch_size: usize,
}

impl CheckOrchestrator {
    /// Build an orchestrator owning its cooldown gate.
    pub fn new(config: &CheckConfig) -> Self {
        Self {
            gate: Arc::new(CooldownGate::new(config.cooldown_window)),
            batch_size: config.batch_size.max(1),
        }
    }

    /// The cooldown gate, shareable with a background sweeper.
    pub fn gate(&self) -> Arc<CooldownGate> {
        Arc::clone(&self.gate)
    }

    /// Run one status sweep for `actor` over `targets`.
    ///
    /// The gate is consulted exactly once per run, before anything else.
    /// Per-target failures are recorded in that target's result and never
    /// abort the run. Returns the complete, order-preserving result list; the
    /// same results go to `sink` in batches as they fill, the last batch
    /// possibly short.
    ///
    /// # Errors
    ///
    /// [`Error::RateLimited`] when the actor's window has not elapsed,
    /// [`Error::EmptyInput`] when there is nothing to check. Both reject the
    /// run before any target is processed.
    pub async fn run(
        &self,
        actor: &str,
        targets: &[CheckTarget],
        checker: &dyn StatusChecker,
        store: &dyn StatusStore,
        sink: &dyn BatchSink,
    ) -> Result<Vec<CheckResult>> {
        if let Acquire::Cooling { remaining } = self.gate.try_acquire(actor) {
            tracing::info!(actor = %actor, remaining = ?remaining, "sweep rejected: actor cooling down");
            return Err(Error::RateLimited {
                retry_after: remaining,
            });
        }
        if targets.is_empty() {
            return Err(Error::EmptyInput);
        }

        tracing::info!(actor = %actor, accounts = targets.len(), "starting status sweep");

        let mut results: Vec<CheckResult> = Vec::with_capacity(targets.len());
        let mut batch: Vec<CheckResult> = Vec::with_capacity(self.batch_size);

        for target in targets {
            let result = self.check_one(target, checker).await;

            if let Some(label) = result.outcome.stored_label() {
                // A failed save loses durability, not the answer
                if let Err(e) = store.save(&result.title, label, result.checked_at).await {
                    tracing::warn!(account = %result.title, error = %e, "failed to persist check result");
                }
            }

            batch.push(result.clone());
            results.push(result);

            if batch.len() == self.batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                self.deliver(sink, full).await;
            }
        }
        if !batch.is_empty() {
            self.deliver(sink, batch).await;
        }

        tracing::info!(actor = %actor, results = results.len(), "status sweep complete");
        Ok(results)
    }

    async fn check_one(&self, target: &CheckTarget, checker: &dyn StatusChecker) -> CheckResult {
        let outcome = if target.known_invalid {
            // A dead credential would only waste a remote check and a solve
            CheckOutcome::InvalidCredential
        } else {
            match checker.check(&target.credential).await {
                Ok(label) => CheckOutcome::Status(label),
                Err(e) => {
                    tracing::warn!(account = %target.title, error = %e, "status check failed");
                    CheckOutcome::CheckError(e.to_string())
                }
            }
        };

        CheckResult {
            title: target.title.clone(),
            outcome,
            checked_at: Utc::now(),
        }
    }

    async fn deliver(&self, sink: &dyn BatchSink, batch: Vec<CheckResult>) {
        let size = batch.len();
        if let Err(e) = sink.deliver(batch).await {
            // Later batches still go out; the caller keeps the full list
            tracing::warn!(batch_size = size, error = %e, "failed to deliver result batch");
        } else {
            tracing::debug!(batch_size = size, "delivered result batch");
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Checker scripted by credential: `fail:*` errors, anything else
    /// resolves to `status:<credential>`.
    #[derive(Default)]
    struct ScriptedChecker {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StatusChecker for ScriptedChecker {
        async fn check(&self, credential: &str) -> Result<String> {
            self.calls
                .lock()
                .expect("checker call log")
                .push(credential.to_string());
            if let Some(detail) = credential.strip_prefix("fail:") {
                Err(Error::Check(detail.to_string()))
            } else {
                Ok(format!("status:{credential}"))
            }
        }
    }

    impl ScriptedChecker {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("checker call log").clone()
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn saved(&self) -> Vec<(String, String)> {
            self.saved.lock().expect("store log").clone()
        }
    }

    #[async_trait]
    impl StatusStore for RecordingStore {
        async fn save(&self, title: &str, status: &str, _checked_at: DateTime<Utc>) -> Result<()> {
            self.saved
                .lock()
                .expect("store log")
                .push((title.to_string(), status.to_string()));
            if self.fail {
                Err(Error::Store("database unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<CheckResult>>>,
        fail_first: bool,
    }

    impl RecordingSink {
        fn failing_first() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_first: true,
            }
        }

        fn batches(&self) -> Vec<Vec<CheckResult>> {
            self.batches.lock().expect("sink log").clone()
        }
    }

    #[async_trait]
    impl BatchSink for RecordingSink {
        async fn deliver(&self, batch: Vec<CheckResult>) -> Result<()> {
            let mut batches = self.batches.lock().expect("sink log");
            let first = batches.is_empty();
            batches.push(batch);
            if first && self.fail_first {
                Err(Error::Sink("channel closed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn orchestrator(window: Duration, batch_size: usize) -> CheckOrchestrator {
        CheckOrchestrator::new(&CheckConfig {
            cooldown_window: window,
            batch_size,
        })
    }

    fn targets(n: usize) -> Vec<CheckTarget> {
        (0..n)
            .map(|i| CheckTarget::new(format!("account-{i:02}"), format!("cred-{i:02}")))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Run-level gating
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn second_run_within_the_window_is_rate_limited() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        orch.run("user-1", &targets(1), &checker, &store, &sink)
            .await
            .expect("first run proceeds");

        let denied = orch
            .run("user-1", &targets(1), &checker, &store, &sink)
            .await;
        match denied {
            Err(Error::RateLimited { retry_after }) => {
                assert!(retry_after <= Duration::from_secs(60));
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }

        // The denied run must not have touched any account
        assert_eq!(
            checker.calls().len(),
            1,
            "a rejected run processes no targets"
        );
    }

    #[tokio::test]
    async fn different_actors_run_independently() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        orch.run("user-1", &targets(1), &checker, &store, &sink)
            .await
            .expect("first actor proceeds");
        orch.run("user-2", &targets(1), &checker, &store, &sink)
            .await
            .expect("second actor is not blocked by the first");
    }

    #[tokio::test]
    async fn empty_target_list_is_rejected() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        let result = orch.run("user-1", &[], &checker, &store, &sink).await;
        assert!(matches!(result, Err(Error::EmptyInput)));
        assert!(sink.batches().is_empty(), "nothing to deliver");
    }

    // -----------------------------------------------------------------------
    // Per-target semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn one_failing_account_does_not_disturb_the_others() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        let targets = vec![
            CheckTarget::new("a", "cred-a"),
            CheckTarget::new("b", "fail:page exploded"),
            CheckTarget::new("c", "cred-c"),
        ];

        let results = orch
            .run("user-1", &targets, &checker, &store, &sink)
            .await
            .expect("run completes despite the failure");

        assert_eq!(results.len(), 3, "every target produces a result");
        assert_eq!(results[0].outcome, CheckOutcome::Status("status:cred-a".into()));
        match &results[1].outcome {
            CheckOutcome::CheckError(detail) => {
                assert!(detail.contains("page exploded"), "detail lost: {detail}");
            }
            other => panic!("middle target should carry the error, got {other:?}"),
        }
        assert_eq!(results[2].outcome, CheckOutcome::Status("status:cred-c".into()));
    }

    #[tokio::test]
    async fn known_invalid_target_never_reaches_the_checker() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        let targets = vec![
            CheckTarget::new("live", "cred-live"),
            CheckTarget::new("dead", "cred-dead").known_invalid(),
        ];

        let results = orch
            .run("user-1", &targets, &checker, &store, &sink)
            .await
            .unwrap();

        assert_eq!(results[1].outcome, CheckOutcome::InvalidCredential);
        assert_eq!(
            checker.calls(),
            vec!["cred-live".to_string()],
            "the dead credential must not trigger a remote check"
        );
    }

    #[tokio::test]
    async fn results_carry_a_completion_timestamp() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        let before = Utc::now();
        let results = orch
            .run("user-1", &targets(1), &checker, &store, &sink)
            .await
            .unwrap();
        let after = Utc::now();

        assert!(results[0].checked_at >= before && results[0].checked_at <= after);
    }

    // -----------------------------------------------------------------------
    // Persistence side effect
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn store_failure_does_not_alter_the_result() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::failing();
        let sink = RecordingSink::default();

        let results = orch
            .run("user-1", &targets(2), &checker, &store, &sink)
            .await
            .expect("save failures never fail the run");

        assert_eq!(results.len(), 2);
        assert!(
            results
                .iter()
                .all(|r| matches!(r.outcome, CheckOutcome::Status(_))),
            "outcomes stay intact when persistence fails"
        );
        assert_eq!(store.saved().len(), 2, "every result was offered to the store");
    }

    #[tokio::test]
    async fn statuses_and_invalid_credentials_are_persisted_but_errors_are_not() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        let targets = vec![
            CheckTarget::new("a", "cred-a"),
            CheckTarget::new("b", "cred-b").known_invalid(),
            CheckTarget::new("c", "fail:oops"),
        ];

        orch.run("user-1", &targets, &checker, &store, &sink)
            .await
            .unwrap();

        let saved = store.saved();
        assert_eq!(
            saved,
            vec![
                ("a".to_string(), "status:cred-a".to_string()),
                ("b".to_string(), "invalid credential".to_string()),
            ],
            "a transient failure must not clobber the last-known status"
        );
    }

    // -----------------------------------------------------------------------
    // Batching
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn twenty_three_targets_arrive_as_ten_ten_three() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        let targets = targets(23);
        let results = orch
            .run("user-1", &targets, &checker, &store, &sink)
            .await
            .unwrap();

        let batches = sink.batches();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 3]);

        // Concatenated batches are exactly the result list, in input order
        let concatenated: Vec<CheckResult> = batches.into_iter().flatten().collect();
        assert_eq!(concatenated, results);
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        let expected: Vec<String> = (0..23).map(|i| format!("account-{i:02}")).collect();
        assert_eq!(titles, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn exact_multiple_of_batch_size_has_no_empty_tail() {
        let orch = orchestrator(Duration::from_secs(60), 5);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::default();

        orch.run("user-1", &targets(10), &checker, &store, &sink)
            .await
            .unwrap();

        let sizes: Vec<usize> = sink.batches().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 5], "no trailing empty batch");
    }

    #[tokio::test]
    async fn failed_batch_delivery_does_not_cancel_later_batches() {
        let orch = orchestrator(Duration::from_secs(60), 10);
        let checker = ScriptedChecker::default();
        let store = RecordingStore::default();
        let sink = RecordingSink::failing_first();

        let results = orch
            .run("user-1", &targets(23), &checker, &store, &sink)
            .await
            .expect("delivery failures never fail the run");

        assert_eq!(results.len(), 23);
        assert_eq!(
            sink.batches().len(),
            3,
            "all batches must be attempted even after the first fails"
        );
    }
}
