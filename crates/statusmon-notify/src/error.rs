//! Notification error types.

use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no recipients to notify")]
    NoRecipients,

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("delivery failed for {failed} of {total} recipients (first error: {first})")]
    Delivery {
        failed: usize,
        total: usize,
        first: String,
    },

    #[error("{0}")]
    Other(String),
}
