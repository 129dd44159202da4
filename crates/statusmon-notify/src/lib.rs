//! statusmon-notify: delivering status-change notifications.
//!
//! The monitor only needs one capability from a transport:
//! `notify(recipients, subject, body)`. [`Notifier`] is that seam;
//! [`SmtpNotifier`] implements it over SMTP with implicit TLS, sending one
//! plain-text message per recipient.

pub mod error;
pub mod memory;
pub mod recipients;
pub mod smtp;

use std::collections::BTreeSet;

use async_trait::async_trait;

pub use error::{NotifyError, NotifyResult};
pub use memory::{MemoryNotifier, SentNotification};
pub use recipients::merge_recipients;
pub use smtp::SmtpNotifier;

/// Something that can deliver a notification to a set of addresses.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipients: &BTreeSet<String>,
        subject: &str,
        body: &str,
    ) -> NotifyResult<()>;
}
