//! Scheduler: runs one engine task per service and waits for all of them.
//!
//! Each service runs in its own tokio task so debounce waits overlap. A task
//! that errors or panics is recorded in the [`BatchReport`]; it never stops
//! its siblings.

use std::any::Any;
use std::sync::Arc;

use statusmon_core::ServiceDescriptor;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

use crate::engine::{Transition, TransitionEngine};
use crate::error::{EngineResult, TaskError};

/// Result of one service's task.
#[derive(Debug)]
pub struct ServiceOutcome {
    pub service: String,
    pub result: Result<Transition, TaskError>,
}

/// Results of a whole batch, in configuration order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ServiceOutcome>,
}

impl BatchReport {
    pub fn get(&self, service: &str) -> Option<&ServiceOutcome> {
        self.outcomes.iter().find(|o| o.service == service)
    }

    /// Number of services whose status changed.
    pub fn changed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(t) if t.is_changed()))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ServiceOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Runs a batch of checks concurrently over a shared engine.
pub struct Scheduler {
    engine: Arc<TransitionEngine>,
}

impl Scheduler {
    pub fn new(engine: TransitionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Check every service once. Returns after every task has finished.
    pub async fn run(&self, services: Vec<ServiceDescriptor>) -> BatchReport {
        info!(services = services.len(), "starting check batch");

        let handles: Vec<(String, JoinHandle<EngineResult<Transition>>)> = services
            .into_iter()
            .map(|service| {
                let engine = self.engine.clone();
                let id = service.id.clone();
                let handle = tokio::spawn(async move { engine.run(&service).await });
                (id, handle)
            })
            .collect();

        let mut report = BatchReport::default();
        for (service, handle) in handles {
            let result = match handle.await {
                Ok(Ok(transition)) => Ok(transition),
                Ok(Err(e)) => Err(TaskError::Engine(e)),
                Err(e) => Err(join_failure(e)),
            };
            if let Err(e) = &result {
                error!(%service, error = %e, "service check failed");
            }
            report.outcomes.push(ServiceOutcome { service, result });
        }

        info!(
            checked = report.outcomes.len(),
            changed = report.changed(),
            failed = report.failures().count(),
            "check batch finished"
        );
        report
    }
}

fn join_failure(error: JoinError) -> TaskError {
    if error.is_panic() {
        TaskError::Panicked(panic_message(error.into_panic()))
    } else {
        TaskError::Cancelled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use async_trait::async_trait;
    use statusmon_core::Status;
    use statusmon_notify::MemoryNotifier;
    use statusmon_state::StatusStore;
    use tokio::time::Instant;
    use url::Url;

    use super::*;
    use crate::debounce::Debouncer;
    use crate::probe::{ProbeError, ProbeResult, Prober};

    /// Reachable unless the host starts with `down`; panics for `panic`
    /// hosts and errors for `broken` hosts.
    struct HostProber;

    #[async_trait]
    impl Prober for HostProber {
        async fn probe(&self, endpoint: &Url) -> Result<ProbeResult, ProbeError> {
            let host = endpoint.host_str().unwrap_or_default();
            if host.starts_with("panic") {
                panic!("prober exploded for {host}");
            }
            if host.starts_with("broken") {
                return Err(ProbeError::Other(format!("cannot probe {host}")));
            }
            if host.starts_with("down") {
                return Ok(ProbeResult::Unreachable {
                    reason: "connection failed".to_string(),
                });
            }
            Ok(ProbeResult::Reachable { detail: None })
        }
    }

    fn service(id: &str, host: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            id: id.to_string(),
            endpoint: format!("https://{host}.example.com/").parse().unwrap(),
            recipients: BTreeSet::from(["ops@example.com".to_string()]),
        }
    }

    fn scheduler(store: &StatusStore, notifier: &Arc<MemoryNotifier>) -> Scheduler {
        let debouncer = Debouncer::new(
            Arc::new(HostProber),
            vec![Duration::from_secs(15), Duration::from_secs(30)],
        );
        Scheduler::new(TransitionEngine::new(
            store.clone(),
            debouncer,
            notifier.clone(),
            BTreeSet::new(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_task_is_isolated() {
        let store = StatusStore::open_in_memory().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());

        let report = scheduler(&store, &notifier)
            .run(vec![
                service("svc1", "web"),
                service("svc2", "panic"),
                service("svc3", "api"),
            ])
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert!(!report.is_success());
        match &report.get("svc2").unwrap().result {
            Err(TaskError::Panicked(msg)) => assert!(msg.contains("prober exploded")),
            other => panic!("expected panic outcome, got {other:?}"),
        }
        assert_eq!(store.get("svc1").unwrap(), Some(Status::Up));
        assert_eq!(store.get("svc2").unwrap(), None);
        assert_eq!(store.get("svc3").unwrap(), Some(Status::Up));
    }

    #[tokio::test(start_paused = true)]
    async fn erroring_task_is_isolated() {
        let store = StatusStore::open_in_memory().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());

        let report = scheduler(&store, &notifier)
            .run(vec![
                service("svc1", "web"),
                service("svc2", "broken"),
                service("svc3", "api"),
            ])
            .await;

        assert!(matches!(
            report.get("svc2").unwrap().result,
            Err(TaskError::Engine(_))
        ));
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.changed(), 2);
        let mut subjects = notifier.subjects();
        subjects.sort();
        assert_eq!(subjects, ["svc1 is UP", "svc3 is UP"]);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_waits_overlap_across_services() {
        let store = StatusStore::open_in_memory().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());

        let start = Instant::now();
        let report = scheduler(&store, &notifier)
            .run(vec![
                service("a", "down-a"),
                service("b", "down-b"),
                service("c", "down-c"),
                service("d", "web"),
            ])
            .await;

        assert!(report.is_success());
        // Three services on the failure path still finish in one 45s window.
        assert_eq!(start.elapsed(), Duration::from_secs(45));
        for id in ["a", "b", "c"] {
            assert_eq!(store.get(id).unwrap(), Some(Status::Down));
        }
        assert_eq!(store.get("d").unwrap(), Some(Status::Up));
    }

    #[tokio::test]
    async fn empty_batch_is_a_success() {
        let store = StatusStore::open_in_memory().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let report = scheduler(&store, &notifier).run(Vec::new()).await;
        assert!(report.is_success());
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn panic_message_handles_both_payload_types() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic payload");
    }
}
