//! Capture Session - foreground service lifecycle for screen sharing
//!
//! Owns the single capture session of the process:
//! - promotion to the foreground with an ongoing notification
//! - custody of the capture grant for the session's lifetime
//! - release of the grant on stop and on teardown

mod error;
mod manager;
mod notification;
mod traits;

pub use error::*;
pub use manager::*;
pub use notification::*;
pub use traits::*;
