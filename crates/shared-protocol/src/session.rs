//! Capture session state and platform capabilities

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, ProtocolResult};

/// Lowest platform API level the shell runs on
pub const MIN_API_LEVEL: u32 = 21;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session, nothing held
    Idle,
    /// Waiting for the user to answer the permission dialog
    AwaitingGrant,
    /// Foreground promotion in progress
    Starting,
    /// Capture is active and the notification is posted
    Running,
    /// Resources released, about to return to idle
    Stopped,
}

impl SessionState {
    /// Check whether `self -> to` is a legal lifecycle step
    pub fn can_transition_to(&self, to: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Idle, AwaitingGrant)
                | (Idle, Starting)
                | (AwaitingGrant, Idle)
                | (AwaitingGrant, Starting)
                | (Starting, Running)
                | (Starting, Idle)
                | (Running, Stopped)
                | (Stopped, Idle)
        )
    }

    /// Validated transition
    pub fn advance(self, to: SessionState) -> ProtocolResult<SessionState> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ProtocolError::InvalidStateTransition { from: self, to })
        }
    }
}

/// Foreground task category requested at promotion time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForegroundCategory {
    /// Tagged as a media projection service
    MediaProjection,
    /// Untyped foreground service
    Generic,
}

/// Platform capabilities, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Consent must be obtained before the service may be promoted
    pub requires_upfront_grant: bool,
    /// Foreground promotion accepts a service category
    pub supports_typed_foreground_promotion: bool,
    /// Notifications must be posted to a registered channel
    pub has_notification_channels: bool,
}

impl PlatformCapabilities {
    /// Resolve capabilities from the platform API level
    pub fn for_api_level(api_level: u32) -> ProtocolResult<Self> {
        if api_level < MIN_API_LEVEL {
            return Err(ProtocolError::UnsupportedApiLevel(api_level));
        }

        Ok(Self {
            requires_upfront_grant: api_level >= 34,
            supports_typed_foreground_promotion: api_level >= 29,
            has_notification_channels: api_level >= 26,
        })
    }

    /// Category to promote with, given whether a grant is held
    pub fn foreground_category(&self, has_grant: bool) -> ForegroundCategory {
        if has_grant && self.supports_typed_foreground_promotion {
            ForegroundCategory::MediaProjection
        } else {
            ForegroundCategory::Generic
        }
    }
}
