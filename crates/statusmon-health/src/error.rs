//! Engine and scheduler error types.

use thiserror::Error;

use crate::probe::ProbeError;

/// Failure of one service's check. Ordinary network failures are not errors;
/// they are `Unreachable` probe results.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("status store error: {0}")]
    State(#[from] statusmon_state::StateError),

    #[error("notification error: {0}")]
    Notify(#[from] statusmon_notify::NotifyError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Why a service task did not produce a result.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was cancelled")]
    Cancelled,
}
