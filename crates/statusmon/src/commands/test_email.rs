use std::collections::BTreeSet;
use std::path::Path;

use statusmon_core::MonitorConfig;
use statusmon_notify::{Notifier, SmtpNotifier};
use tracing::info;

pub const TEST_SUBJECT: &str = "Test Email";

/// Send one test message to `to` using the `[email]` account from the config.
pub async fn test_email(config_path: &Path, to: &str) -> anyhow::Result<()> {
    let config = MonitorConfig::from_file(config_path)?;
    let notifier = SmtpNotifier::new(&config.email)?;
    let recipients = BTreeSet::from([to.trim().to_string()]);
    let body = format!(
        "This is a test email sent by status-monitor from {}.",
        config.email.from_address
    );

    notifier.notify(&recipients, TEST_SUBJECT, &body).await?;
    info!(%to, "test email sent");
    println!("✓ Sent test email to {to}");
    Ok(())
}
