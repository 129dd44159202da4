//! Status-change message text.

use chrono::{DateTime, SecondsFormat, Utc};
use statusmon_core::{CheckResult, ServiceDescriptor, Status};

/// Subject and body of a status-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Compose the message for a confirmed transition `previous -> check.status`
    /// decided at `at`.
    pub fn transition(
        service: &ServiceDescriptor,
        previous: Option<Status>,
        check: &CheckResult,
        at: DateTime<Utc>,
    ) -> Self {
        let name = &service.id;
        let status = check.status;
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, false);

        let change = match previous {
            Some(old) => format!("changed from {old} to {status}"),
            None => format!("changed to {status}"),
        };
        let mut body = format!(
            "This is an automated monitoring email.\n\nAt {timestamp} the status of {name} {change}.\n"
        );
        body.push_str(&format!("\nEndpoint: {}\n", service.endpoint));
        if let Some(detail) = &check.detail {
            body.push_str(&format!("Detail: {detail}\n"));
        }

        Self {
            subject: format!("{name} is {status}"),
            body,
        }
    }
}
