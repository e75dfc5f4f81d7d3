//! Shared Protocol Definitions for the screen mirroring shell
//!
//! This crate contains the grant, session and method-channel types shared
//! by the permission coordinator, the capture session manager and the
//! platform shim.

mod channel;
mod error;
mod grant;
mod session;

pub use channel::*;
pub use error::*;
pub use grant::*;
pub use session::*;

/// Method channel the UI layer talks to
pub const SERVICE_CHANNEL: &str = "com.wifimirror/service";

/// Request code tagging the media projection permission exchange
pub const MEDIA_PROJECTION_REQUEST_CODE: i32 = 1001;

/// Id of the ongoing capture notification
pub const FOREGROUND_NOTIFICATION_ID: i32 = 1;

/// Reason surfaced to the UI when consent is not given
pub const PERMISSION_DENIED_REASON: &str = "User denied screen capture permission";
