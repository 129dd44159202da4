//! `config.toml` parser.
//!
//! The document has three parts: an `[email]` table with the SMTP account and
//! the global recipients, an optional `[check]` table tuning the probe and
//! debounce timings, and one `[services.<name>]` table per monitored service.
//! Everything is validated up front so that a bad file aborts the run before
//! any service is probed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::duration::parse_duration;
use crate::types::ServiceDescriptor;

/// Default SMTP port (implicit TLS).
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Default `User-Agent` sent with every probe.
pub const DEFAULT_USER_AGENT: &str = "status-monitor/1.0";

/// Number of re-probes on the failure path: DOWN needs three failed attempts.
pub const RETRY_COUNT: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("service {service}: invalid http_endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        service: String,
        endpoint: String,
        reason: String,
    },

    #[error("service {0}: no notification recipients (set services.{0}.email or email.to_addresses)")]
    NoRecipients(String),

    #[error("check.{field}: invalid duration {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("check.{field}: {reason}")]
    InvalidCheck { field: &'static str, reason: String },
}

/// One address or a list of addresses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Addresses {
    One(String),
    Many(Vec<String>),
}

impl Default for Addresses {
    fn default() -> Self {
        Addresses::Many(Vec::new())
    }
}

impl Addresses {
    /// Normalize into a de-duplicated set, dropping blank entries.
    pub fn to_set(&self) -> BTreeSet<String> {
        let items: &[String] = match self {
            Addresses::One(one) => std::slice::from_ref(one),
            Addresses::Many(many) => many,
        };
        items
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The `[email]` section: SMTP account plus global recipients.
#[derive(Clone, Deserialize)]
pub struct EmailConfig {
    /// Recipients notified about every service, in addition to the
    /// per-service addresses.
    #[serde(default)]
    pub to_addresses: Addresses,
    pub from_address: String,
    pub smtp_address: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl EmailConfig {
    pub fn global_recipients(&self) -> BTreeSet<String> {
        self.to_addresses.to_set()
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("to_addresses", &self.to_addresses)
            .field("from_address", &self.from_address)
            .field("smtp_address", &self.smtp_address)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"<redacted>")
            .finish()
    }
}

/// A `[services.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub email: Addresses,
    pub http_endpoint: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawCheckConfig {
    timeout: Option<String>,
    retry_delays: Option<Vec<String>>,
    user_agent: Option<String>,
}

/// Resolved probe and debounce settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    /// Per-attempt probe timeout.
    pub timeout: Duration,
    /// Waits before each re-probe on the failure path. Always
    /// [`RETRY_COUNT`] entries.
    pub retry_delays: Vec<Duration>,
    pub user_agent: String,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_delays: vec![Duration::from_secs(15), Duration::from_secs(30)],
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl RawCheckConfig {
    fn resolve(self) -> Result<CheckSettings, ConfigError> {
        let defaults = CheckSettings::default();
        let timeout = match self.timeout {
            Some(value) => duration_field("timeout", &value)?,
            None => defaults.timeout,
        };
        if timeout.is_zero() {
            return Err(ConfigError::InvalidCheck {
                field: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        let retry_delays = match self.retry_delays {
            Some(values) => values
                .iter()
                .map(|value| duration_field("retry_delays", value))
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.retry_delays,
        };
        if retry_delays.len() != RETRY_COUNT {
            return Err(ConfigError::InvalidCheck {
                field: "retry_delays",
                reason: format!(
                    "expected exactly {RETRY_COUNT} delays, got {}",
                    retry_delays.len()
                ),
            });
        }
        Ok(CheckSettings {
            timeout,
            retry_delays,
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        })
    }
}

fn duration_field(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    email: EmailConfig,
    #[serde(default)]
    check: RawCheckConfig,
    #[serde(default)]
    services: BTreeMap<String, ServiceConfig>,
}

/// Validated monitor configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub email: EmailConfig,
    pub check: CheckSettings,
    /// Services in name order.
    pub services: Vec<ServiceDescriptor>,
}

impl MonitorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let globals = raw.email.global_recipients();

        let services = raw
            .services
            .into_iter()
            .map(|(id, svc)| {
                let endpoint = parse_endpoint(&id, &svc.http_endpoint)?;
                let recipients = svc.email.to_set();
                if recipients.is_empty() && globals.is_empty() {
                    return Err(ConfigError::NoRecipients(id));
                }
                Ok(ServiceDescriptor {
                    id,
                    endpoint,
                    recipients,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            email: raw.email,
            check: raw.check.resolve()?,
            services,
        })
    }
}

fn parse_endpoint(service: &str, endpoint: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        service: service.to_string(),
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other:?}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
