use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use statusmon_core::MonitorConfig;
use statusmon_health::{BatchReport, Debouncer, HttpProber, Scheduler, TransitionEngine};
use statusmon_notify::SmtpNotifier;
use statusmon_state::StatusStore;
use tracing::info;

/// Run one batch: load config, open the store, check every service.
pub async fn run(config_path: &Path, database: &Path) -> anyhow::Result<()> {
    let config = MonitorConfig::from_file(config_path)?;
    info!(
        path = %config_path.display(),
        services = config.services.len(),
        "configuration loaded"
    );

    let store = StatusStore::open(database)
        .with_context(|| format!("failed to open status database {}", database.display()))?;
    let prober = HttpProber::new(&config.check)?;
    let notifier = SmtpNotifier::new(&config.email)?;

    let debouncer = Debouncer::new(Arc::new(prober), config.check.retry_delays.clone());
    let engine = TransitionEngine::new(
        store,
        debouncer,
        Arc::new(notifier),
        config.email.global_recipients(),
    );
    let scheduler = Scheduler::new(engine);
    let report = scheduler.run(config.services).await;

    // Last handle to the database; dropping it closes the file.
    drop(scheduler);
    info!(path = %database.display(), "status database closed");

    summarize(&report)
}

/// Turn a finished batch into the process result: any failed service makes
/// the run fail, after every other service has been handled.
fn summarize(report: &BatchReport) -> anyhow::Result<()> {
    let failed: Vec<&str> = report.failures().map(|o| o.service.as_str()).collect();
    if failed.is_empty() {
        return Ok(());
    }
    anyhow::bail!(
        "{} of {} service checks failed: {}",
        failed.len(),
        report.outcomes.len(),
        failed.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use statusmon_core::Status;
    use statusmon_health::{EngineError, ProbeError, ServiceOutcome, TaskError, Transition};

    use super::*;

    #[tokio::test]
    async fn missing_config_is_fatal_before_touching_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("status.redb");

        let err = run(&dir.path().join("missing.toml"), &database)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("config file not found"));
        assert!(!database.exists());
    }

    #[tokio::test]
    async fn malformed_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[email\nbroken").unwrap();

        let err = run(&config, &dir.path().join("status.redb")).await.unwrap_err();
        assert!(err.to_string().contains("malformed config"));
    }

    #[tokio::test]
    async fn config_without_services_runs_an_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            r#"
[email]
from_address = "monitor@example.com"
smtp_address = "smtp.example.com"
smtp_username = "u"
smtp_password = "p"
"#,
        )
        .unwrap();
        let database = dir.path().join("status.redb");

        run(&config, &database).await.unwrap();
        assert!(database.exists());
    }

    #[test]
    fn summary_fails_when_any_service_failed() {
        let report = BatchReport {
            outcomes: vec![
                ServiceOutcome {
                    service: "svc1".to_string(),
                    result: Ok(Transition::Unchanged(Status::Up)),
                },
                ServiceOutcome {
                    service: "svc2".to_string(),
                    result: Err(TaskError::Engine(EngineError::Probe(ProbeError::Other(
                        "boom".to_string(),
                    )))),
                },
            ],
        };
        let err = summarize(&report).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 service checks failed: svc2");
    }

    #[test]
    fn summary_succeeds_for_clean_batch() {
        assert!(summarize(&BatchReport::default()).is_ok());
    }
}
