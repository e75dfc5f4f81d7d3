//! Screen capture consent tokens

use bytes::Bytes;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Platform result code reported for a successful exchange
pub const RESULT_OK: i32 = -1;

/// Platform result code reported when the user dismisses the dialog
pub const RESULT_CANCELED: i32 = 0;

/// Outcome of the OS permission exchange, as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// The user accepted the capture request
    Ok,
    /// The platform refused the exchange
    Denied,
    /// The user dismissed the dialog
    Cancelled,
}

impl PermissionStatus {
    /// Map a raw platform result code
    pub fn from_result_code(code: i32) -> Self {
        match code {
            RESULT_OK => Self::Ok,
            RESULT_CANCELED => Self::Cancelled,
            _ => Self::Denied,
        }
    }
}

/// Capability token proving the user has authorized screen capture.
///
/// Only lives for the process that issued it: it is neither `Clone` nor
/// serializable, and the session manager drops it when the session ends.
pub struct CaptureGrant {
    id: Uuid,
    result_code: PermissionStatus,
    payload: Bytes,
    issued_at: Instant,
}

impl CaptureGrant {
    /// Build a grant from a platform exchange.
    ///
    /// Returns `None` unless the exchange succeeded and carried a payload.
    pub fn from_exchange(status: PermissionStatus, payload: Option<Bytes>) -> Option<Self> {
        match (status, payload) {
            (PermissionStatus::Ok, Some(payload)) if !payload.is_empty() => Some(Self {
                id: Uuid::new_v4(),
                result_code: status,
                payload,
                issued_at: Instant::now(),
            }),
            _ => None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn result_code(&self) -> PermissionStatus {
        self.result_code
    }

    /// Opaque descriptor needed to open the capture stream
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Time since the user gave consent
    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }
}

impl std::fmt::Debug for CaptureGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGrant")
            .field("id", &self.id)
            .field("result_code", &self.result_code)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
