//! statusmon-health: reachability checks and the status transition engine.
//!
//! One run of the monitor checks every configured service once. Each service
//! gets its own task; a probe that fails is confirmed by re-probing after
//! fixed delays before the service is declared DOWN. Only a confirmed change
//! against the stored status produces a notification and a store write.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   └── one task per service
//!       └── TransitionEngine
//!           ├── Debouncer
//!           │   ├── DebounceTracker (Initial → Retry(1) → Retry(2) → Decided)
//!           │   └── Prober::probe() → ProbeResult
//!           ├── StatusStore::get / set
//!           └── Notifier::notify on transition
//! ```
//!
//! # Debouncing
//!
//! Success is reported immediately. A failed probe is retried after 15s and
//! again after a further 30s (configurable); only three consecutive failures
//! yield DOWN. The waits are `tokio::time::sleep`, so they never hold up
//! other services.

pub mod debounce;
pub mod engine;
pub mod error;
pub mod notification;
pub mod probe;
pub mod scheduler;

pub use debounce::{DebounceState, DebounceTracker, Debouncer, Step};
pub use engine::{Transition, TransitionEngine};
pub use error::{EngineError, EngineResult, TaskError};
pub use notification::Notification;
pub use probe::{HttpProber, ProbeError, ProbeResult, Prober};
pub use scheduler::{BatchReport, Scheduler, ServiceOutcome};
