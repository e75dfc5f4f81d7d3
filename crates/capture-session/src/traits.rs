//! Foreground service host abstraction

use serde::{Deserialize, Serialize};
use shared_protocol::{FOREGROUND_NOTIFICATION_ID, ForegroundCategory};

use crate::{HostResult, Notification, NotificationChannel, NotificationImportance};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Notification channel id
    pub channel_id: String,
    /// User-visible channel name
    pub channel_name: String,
    /// Id of the ongoing notification
    pub notification_id: i32,
    /// Notification title
    pub title: String,
    /// Notification body
    pub text: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_id: "screen_capture_channel".to_string(),
            channel_name: "Screen Capture Service".to_string(),
            notification_id: FOREGROUND_NOTIFICATION_ID,
            title: "Screen Sharing".to_string(),
            text: "Sharing your screen...".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn channel(&self) -> NotificationChannel {
        NotificationChannel {
            id: self.channel_id.clone(),
            name: self.channel_name.clone(),
            importance: NotificationImportance::Default,
        }
    }

    pub fn notification(&self) -> Notification {
        Notification {
            id: self.notification_id,
            channel_id: self.channel_id.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
            ongoing: true,
            importance: NotificationImportance::Default,
        }
    }
}

/// OS foreground-service / notification facility.
///
/// Calls are made while the session lock is held; implementations must not
/// call back into the session manager.
pub trait ForegroundHost: Send + Sync {
    /// Register a notification channel. Must be idempotent.
    fn create_channel(&self, channel: &NotificationChannel) -> HostResult<()>;

    /// Post the notification and promote the service to the foreground
    fn start_foreground(
        &self,
        notification: &Notification,
        category: ForegroundCategory,
    ) -> HostResult<()>;

    /// Drop foreground status and remove the notification
    fn stop_foreground(&self, notification_id: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_notification_is_ongoing() {
        let config = SessionConfig::default();

        let channel = config.channel();
        assert_eq!(channel.id, "screen_capture_channel");
        assert_eq!(channel.importance, NotificationImportance::Default);

        let notification = config.notification();
        assert_eq!(notification.id, FOREGROUND_NOTIFICATION_ID);
        assert_eq!(notification.channel_id, channel.id);
        assert!(notification.ongoing);
        assert_eq!(notification.importance, NotificationImportance::Default);
    }
}
