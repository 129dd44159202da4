//! In-memory notifier (for testing).

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{NotifyError, NotifyResult};
use crate::Notifier;

/// A notification captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipients: BTreeSet<String>,
    pub subject: String,
    pub body: String,
}

/// Records every notification instead of delivering it. Can be switched into
/// a failing mode to exercise delivery errors.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of everything delivered so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Subjects delivered so far, in delivery order.
    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.subject).collect()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(
        &self,
        recipients: &BTreeSet<String>,
        subject: &str,
        body: &str,
    ) -> NotifyResult<()> {
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Other("memory notifier set to fail".to_string()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| NotifyError::Other("notification log poisoned".to_string()))?;
        sent.push(SentNotification {
            recipients: recipients.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
