//! Permission coordinator error types

use capture_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("A screen capture permission request is already pending")]
    AlreadyPending,

    #[error("Failed to launch permission dialog: {0}")]
    Launch(String),

    #[error("Permission request abandoned before the platform answered")]
    Abandoned,

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Failure reported by the platform permission facility
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExchangeError(pub String);
