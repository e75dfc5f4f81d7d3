//! Application state management

use capture_session::CaptureSessionManager;
use permission_coordinator::PermissionCoordinator;
use serde::Serialize;
use shared_protocol::{ChannelReply, ForegroundCategory};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::ShellConfig;
use crate::host::{DialogExchange, NotifyingHost};

/// Everything the shim writes to stdout, one JSON object per line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Reply(ChannelReply),
    LaunchPermissionDialog {
        request_code: i32,
    },
    ForegroundStarted {
        notification_id: i32,
        title: String,
        text: String,
        category: ForegroundCategory,
    },
    ForegroundStopped {
        notification_id: i32,
    },
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Application-wide state
pub struct AppState {
    pub coordinator: PermissionCoordinator,
    pub outbound: OutboundSender,
}

impl AppState {
    pub fn new(config: &ShellConfig, outbound: OutboundSender) -> anyhow::Result<Self> {
        let capabilities = config.capabilities()?;
        let host = Arc::new(NotifyingHost::new(outbound.clone()));
        let sessions = Arc::new(CaptureSessionManager::new(
            host,
            capabilities,
            config.session.clone(),
        ));
        let exchange = Arc::new(DialogExchange::new(outbound.clone()));

        Ok(Self {
            coordinator: PermissionCoordinator::new(exchange, sessions),
            outbound,
        })
    }
}
