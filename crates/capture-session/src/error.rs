//! Capture session error types

use shared_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Screen capture grant required before the service can be promoted")]
    NoGrant,

    #[error("Foreground promotion refused: {0}")]
    PromotionRefused(String),

    #[error("Capture session already running")]
    AlreadyRunning,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Rejection reported by the platform foreground facility
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HostError(pub String);

pub type HostResult<T> = Result<T, HostError>;
