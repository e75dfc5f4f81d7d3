//! Permission Coordinator - screen capture consent for the capture session
//!
//! Runs the one-shot permission exchange with the platform and, once the
//! user agrees, hands the resulting grant straight to the session manager.

mod coordinator;
mod error;

pub use coordinator::*;
pub use error::*;
