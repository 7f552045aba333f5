//! # banwatch
//!
//! Backend library for bots that track the ban status of game accounts.
//!
//! The host application (typically a Discord bot) owns the user surface and
//! the database; banwatch owns the part with actual moving pieces:
//! - a client for an asynchronous create-then-poll CAPTCHA task service,
//! - a per-actor cooldown gate safe under arbitrary concurrency,
//! - a sweep orchestrator that checks every account an actor owns,
//!   isolating per-account failures and delivering results in
//!   provider-sized batches.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Narrow seams** - Discord, storage, and page heuristics stay behind
//!   caller-supplied traits
//! - **Failure isolation** - One bad account never spoils a sweep; one slow
//!   solve never blocks past its deadline
//!
//! ## Quick Start
//!
//! ```no_run
//! use banwatch::{BatchSink, CheckOrchestrator, CheckTarget, Config, StatusChecker, StatusStore};
//!
//! # async fn sweep(
//! #     checker: &dyn StatusChecker,
//! #     store: &dyn StatusStore,
//! #     sink: &dyn BatchSink,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.solver.client_key = "solver-account-key".to_string();
//! config.endpoint.url = "https://game.example.com/account".to_string();
//! config.validate()?;
//!
//! let orchestrator = CheckOrchestrator::new(&config.checks);
//!
//! let targets = vec![CheckTarget::new("main account", "session-cookie-value")];
//! let results = orchestrator
//!     .run("discord-user-1", &targets, checker, store, sink)
//!     .await?;
//! println!("checked {} accounts", results.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Account status checking
pub mod checker;
/// Configuration types
pub mod config;
/// Per-actor cooldown gating
pub mod cooldown;
/// Error types
pub mod error;
/// Sweep orchestration and batch delivery
pub mod orchestrator;
/// Client for the asynchronous task-solving service
pub mod solver;
/// Core types
pub mod types;

// Re-export commonly used types
pub use checker::{HttpStatusChecker, PageClassifier, StatusChecker};
pub use config::{CheckConfig, Config, EndpointConfig, SolverConfig};
pub use cooldown::{Acquire, CooldownGate};
pub use error::{Error, Result, SolveError};
pub use orchestrator::{BatchSink, CheckOrchestrator, StatusStore};
pub use solver::{RECAPTCHA_RESPONSE_FIELD, Solution, SolverClient, TaskSpec};
pub use types::{CheckOutcome, CheckResult, CheckTarget, TaskId};
