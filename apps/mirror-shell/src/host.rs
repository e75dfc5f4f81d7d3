//! Platform facilities backed by the shim's output stream

use capture_session::{ForegroundHost, HostError, HostResult, Notification, NotificationChannel};
use permission_coordinator::{ExchangeError, PermissionExchange};
use shared_protocol::ForegroundCategory;
use tracing::{debug, info};

use crate::state::{Outbound, OutboundSender};

/// Foreground host that reports promotions to the UI side
pub struct NotifyingHost {
    outbound: OutboundSender,
}

impl NotifyingHost {
    pub fn new(outbound: OutboundSender) -> Self {
        Self { outbound }
    }
}

impl ForegroundHost for NotifyingHost {
    fn create_channel(&self, channel: &NotificationChannel) -> HostResult<()> {
        debug!(
            "Notification channel {} ({}) registered with {:?} importance",
            channel.id, channel.name, channel.importance
        );
        Ok(())
    }

    fn start_foreground(
        &self,
        notification: &Notification,
        category: ForegroundCategory,
    ) -> HostResult<()> {
        info!(
            "Posting notification {} on {} as {:?}",
            notification.id, notification.channel_id, category
        );
        self.outbound
            .send(Outbound::ForegroundStarted {
                notification_id: notification.id,
                title: notification.title.clone(),
                text: notification.text.clone(),
                category,
            })
            .map_err(|_| HostError("shell output closed".to_string()))
    }

    fn stop_foreground(&self, notification_id: i32) {
        info!("Removing notification {}", notification_id);
        if self
            .outbound
            .send(Outbound::ForegroundStopped { notification_id })
            .is_err()
        {
            debug!("Shell output closed, foreground stop not reported");
        }
    }
}

/// Permission exchange that asks the UI side to show the consent dialog
pub struct DialogExchange {
    outbound: OutboundSender,
}

impl DialogExchange {
    pub fn new(outbound: OutboundSender) -> Self {
        Self { outbound }
    }
}

impl PermissionExchange for DialogExchange {
    fn launch(&self, request_code: i32) -> Result<(), ExchangeError> {
        self.outbound
            .send(Outbound::LaunchPermissionDialog { request_code })
            .map_err(|_| ExchangeError("shell output closed".to_string()))
    }
}
