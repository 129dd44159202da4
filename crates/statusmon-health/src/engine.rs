//! Transition engine: one debounced check per service against the store.
//!
//! Side effects happen only on a confirmed change: the notification is sent
//! first and the new status is stored after it. If delivery fails the store
//! keeps the old value, so the next run detects the same transition again.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use statusmon_core::{ServiceDescriptor, Status};
use statusmon_notify::{merge_recipients, Notifier};
use statusmon_state::StatusStore;
use tracing::{debug, info};

use crate::debounce::Debouncer;
use crate::error::EngineResult;
use crate::notification::Notification;

/// Outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Confirmed status equals the stored one; nothing was sent or written.
    Unchanged(Status),
    /// Status changed (or was observed for the first time); a notification
    /// was delivered and the new status stored.
    Changed { from: Option<Status>, to: Status },
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Transition::Changed { .. })
    }
}

/// Decides and applies status transitions for individual services.
pub struct TransitionEngine {
    store: StatusStore,
    debouncer: Debouncer,
    notifier: Arc<dyn Notifier>,
    global_recipients: BTreeSet<String>,
}

impl TransitionEngine {
    pub fn new(
        store: StatusStore,
        debouncer: Debouncer,
        notifier: Arc<dyn Notifier>,
        global_recipients: BTreeSet<String>,
    ) -> Self {
        Self {
            store,
            debouncer,
            notifier,
            global_recipients,
        }
    }

    /// Check one service and apply any transition.
    pub async fn run(&self, service: &ServiceDescriptor) -> EngineResult<Transition> {
        let check = self.debouncer.check(&service.id, &service.endpoint).await?;
        let previous = self.store.get(&service.id)?;

        if previous == Some(check.status) {
            debug!(service = %service.id, status = %check.status, "status unchanged");
            return Ok(Transition::Unchanged(check.status));
        }

        let notification = Notification::transition(service, previous, &check, Utc::now());
        let recipients = merge_recipients(&service.recipients, &self.global_recipients);
        self.notifier
            .notify(&recipients, &notification.subject, &notification.body)
            .await?;

        self.store.set(&service.id, check.status)?;

        info!(
            service = %service.id,
            from = previous.map(|s| s.as_str()).unwrap_or("none"),
            to = %check.status,
            detail = check.detail.as_deref().unwrap_or(""),
            "status changed"
        );
        Ok(Transition::Changed {
            from: previous,
            to: check.status,
        })
    }
}
