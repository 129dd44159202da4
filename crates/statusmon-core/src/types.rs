//! Shared types used across status-monitor crates.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Confirmed availability of a service.
///
/// There is deliberately no "unknown" variant: a service that has never been
/// observed simply has no stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Down,
}

impl Status {
    /// The persisted and displayed form: `"UP"` or `"DOWN"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "UP",
            Status::Down => "DOWN",
        }
    }

    /// Decode a stored value. Anything other than exact `UP`/`DOWN` bytes
    /// yields `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"UP" => Some(Status::Up),
            b"DOWN" => Some(Status::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service to monitor, as resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Unique name of the service; also the status store key.
    pub id: String,
    /// HTTP(S) endpoint probed with a GET request.
    pub endpoint: Url,
    /// Service-specific notification recipients.
    pub recipients: BTreeSet<String>,
}

/// Outcome of a debounced check, before it is compared with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub status: Status,
    /// Human-readable detail from the deciding probe, e.g. `"200 OK"` or
    /// `"connection refused"`.
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn up(detail: Option<String>) -> Self {
        Self {
            status: Status::Up,
            detail,
        }
    }

    pub fn down(detail: Option<String>) -> Self {
        Self {
            status: Status::Down,
            detail,
        }
    }
}
