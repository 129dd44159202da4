//! Single-attempt reachability probes.
//!
//! A probe is one HTTP GET with a bounded timeout. Connection errors, DNS
//! failures, timeouts and non-2xx responses are all ordinary outcomes
//! ([`ProbeResult::Unreachable`]); only a request that cannot be built at
//! all is a [`ProbeError`].

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use statusmon_core::CheckSettings;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Result of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint answered with 2xx. `detail` is the status line.
    Reachable { detail: Option<String> },
    /// Connection failure, timeout or non-2xx answer.
    Unreachable { reason: String },
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeResult::Reachable { .. })
    }
}

/// A probe that could not be performed for reasons other than the network.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid request for {endpoint}: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Performs one reachability check.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &Url) -> Result<ProbeResult, ProbeError>;
}

/// HTTP GET prober backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(settings: &CheckSettings) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(ProbeError::Client)?;
        Ok(Self {
            client,
            timeout: settings.timeout,
        })
    }

    fn describe_failure(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs_f64())
        } else if error.is_connect() {
            format!("connection failed: {}", error_chain(error))
        } else {
            error_chain(error)
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &Url) -> Result<ProbeResult, ProbeError> {
        match self.client.get(endpoint.clone()).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    debug!(%endpoint, %status, "probe succeeded");
                    Ok(ProbeResult::Reachable {
                        detail: Some(status.to_string()),
                    })
                } else {
                    debug!(%endpoint, %status, "probe non-2xx");
                    Ok(ProbeResult::Unreachable {
                        reason: format!("HTTP {status}"),
                    })
                }
            }
            Err(e) if e.is_builder() => Err(ProbeError::Request {
                endpoint: endpoint.to_string(),
                source: e,
            }),
            Err(e) => {
                let reason = self.describe_failure(&e);
                debug!(%endpoint, %reason, "probe failed");
                Ok(ProbeResult::Unreachable { reason })
            }
        }
    }
}

/// Render an error with its source chain, `outer: inner: root`.
fn error_chain(error: &reqwest::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
