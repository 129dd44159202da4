//! SMTP notifier.
//!
//! Connects to the configured relay with implicit TLS, authenticates with
//! the account credentials and sends one `text/plain` message per recipient,
//! each carrying only its own address in `To`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use statusmon_core::EmailConfig;
use tracing::{debug, info, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::Notifier;

/// Sends notifications from a fixed account through one SMTP relay.
pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Build a notifier from the `[email]` config section.
    ///
    /// No connection is made here; the relay is contacted on first send.
    pub fn new(config: &EmailConfig) -> NotifyResult<Self> {
        let from = parse_mailbox(&config.from_address)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_address)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        debug!(
            relay = %config.smtp_address,
            port = config.smtp_port,
            from = %from,
            "smtp notifier configured"
        );
        Ok(Self { from, transport })
    }

    fn build_message(&self, to: Mailbox, subject: &str, body: &str) -> NotifyResult<Message> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(
        &self,
        recipients: &BTreeSet<String>,
        subject: &str,
        body: &str,
    ) -> NotifyResult<()> {
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        // Every recipient is attempted even if an earlier one fails.
        let mut failures = Vec::new();
        for address in recipients {
            let sent = match parse_mailbox(address) {
                Ok(to) => match self.build_message(to, subject, body) {
                    Ok(message) => self.transport.send(message).await.map_err(NotifyError::from),
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            match sent {
                Ok(_) => debug!(%address, %subject, "notification sent"),
                Err(e) => {
                    warn!(%address, error = %e, "notification delivery failed");
                    failures.push(e);
                }
            }
        }

        if let Some(first) = failures.first() {
            return Err(NotifyError::Delivery {
                failed: failures.len(),
                total: recipients.len(),
                first: first.to_string(),
            });
        }

        info!(recipients = recipients.len(), %subject, "notification delivered");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> NotifyResult<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statusmon_core::config::Addresses;

    fn email_config(from: &str) -> EmailConfig {
        EmailConfig {
            to_addresses: Addresses::One("ops@example.com".to_string()),
            from_address: from.to_string(),
            smtp_address: "smtp.example.com".to_string(),
            smtp_port: 465,
            smtp_username: "monitor".to_string(),
            smtp_password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn builds_from_config_without_connecting() {
        assert!(SmtpNotifier::new(&email_config("monitor@example.com")).is_ok());
    }

    #[tokio::test]
    async fn invalid_sender_is_rejected() {
        let err = SmtpNotifier::new(&email_config("not an address")).err().unwrap();
        assert!(matches!(err, NotifyError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn message_is_plain_text_with_single_recipient() {
        let notifier = SmtpNotifier::new(&email_config("monitor@example.com")).unwrap();
        let message = notifier
            .build_message(
                parse_mailbox("web@example.com").unwrap(),
                "website is DOWN",
                "body text",
            )
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: monitor@example.com"));
        assert!(raw.contains("To: web@example.com"));
        assert!(raw.contains("Subject: website is DOWN"));
        assert!(raw.contains("Content-Type: text/plain"));
    }

    #[tokio::test]
    async fn empty_recipient_set_is_an_error() {
        let notifier = SmtpNotifier::new(&email_config("monitor@example.com")).unwrap();
        let err = notifier
            .notify(&BTreeSet::new(), "subject", "body")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipients));
    }

    #[tokio::test]
    async fn bad_recipient_is_reported_without_touching_the_network() {
        let notifier = SmtpNotifier::new(&email_config("monitor@example.com")).unwrap();
        let recipients = BTreeSet::from(["definitely not an address".to_string()]);
        let err = notifier.notify(&recipients, "s", "b").await.unwrap_err();
        assert!(matches!(err, NotifyError::Delivery { failed: 1, total: 1, .. }));
    }
}
