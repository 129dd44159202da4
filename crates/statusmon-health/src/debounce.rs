//! Confirm-on-failure debouncing.
//!
//! [`DebounceTracker`] is the pure state machine: feed it probe results and
//! it answers with either a decision or the delay before the next attempt.
//! [`Debouncer`] drives a tracker against a [`Prober`], sleeping between
//! attempts.

use std::sync::Arc;
use std::time::Duration;

use statusmon_core::CheckResult;
use tracing::{debug, info};
use url::Url;

use crate::probe::{ProbeError, ProbeResult, Prober};

/// Where a check currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState {
    /// No probe recorded yet.
    Initial,
    /// `n` failures seen, waiting to re-probe.
    Retry(usize),
    /// Final answer reached.
    Decided(CheckResult),
}

/// What to do after recording a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Decided(CheckResult),
    RetryAfter(Duration),
}

/// Tracks consecutive probe results for one check.
///
/// With `n` retry delays a check makes at most `n + 1` probes. Any reachable
/// probe decides UP immediately; failing every attempt decides DOWN.
#[derive(Debug)]
pub struct DebounceTracker<'a> {
    retry_delays: &'a [Duration],
    state: DebounceState,
}

impl<'a> DebounceTracker<'a> {
    pub fn new(retry_delays: &'a [Duration]) -> Self {
        Self {
            retry_delays,
            state: DebounceState::Initial,
        }
    }

    /// Record a probe result and return the next step.
    ///
    /// Once decided, further results are ignored and the decision is
    /// repeated.
    pub fn record(&mut self, result: ProbeResult) -> Step {
        let failures = match &self.state {
            DebounceState::Decided(decided) => return Step::Decided(decided.clone()),
            DebounceState::Initial => 0,
            DebounceState::Retry(n) => *n,
        };

        match result {
            ProbeResult::Reachable { detail } => self.decide(CheckResult::up(detail)),
            ProbeResult::Unreachable { reason } => match self.retry_delays.get(failures) {
                Some(delay) => {
                    self.state = DebounceState::Retry(failures + 1);
                    Step::RetryAfter(*delay)
                }
                None => self.decide(CheckResult::down(Some(reason))),
            },
        }
    }

    fn decide(&mut self, result: CheckResult) -> Step {
        self.state = DebounceState::Decided(result.clone());
        Step::Decided(result)
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> usize {
        match self.state {
            DebounceState::Retry(n) => n,
            _ => 0,
        }
    }
}

/// Runs a debounced check against an endpoint.
#[derive(Clone)]
pub struct Debouncer {
    prober: Arc<dyn Prober>,
    retry_delays: Vec<Duration>,
}

impl Debouncer {
    pub fn new(prober: Arc<dyn Prober>, retry_delays: Vec<Duration>) -> Self {
        Self {
            prober,
            retry_delays,
        }
    }

    /// Probe until the tracker reaches a decision. Each wait is awaited in
    /// full before the next attempt.
    pub async fn check(&self, service: &str, endpoint: &Url) -> Result<CheckResult, ProbeError> {
        let mut tracker = DebounceTracker::new(&self.retry_delays);
        loop {
            let result = self.prober.probe(endpoint).await?;
            if let ProbeResult::Unreachable { reason } = &result {
                debug!(%service, attempt = tracker.failures() + 1, %reason, "probe unreachable");
            }
            match tracker.record(result) {
                Step::Decided(decided) => return Ok(decided),
                Step::RetryAfter(delay) => {
                    info!(
                        %service,
                        failures = tracker.failures(),
                        delay_secs = delay.as_secs_f64(),
                        "probe failed, re-checking after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
