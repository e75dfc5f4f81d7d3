//! Notification descriptors handed to the foreground host

/// Channel / notification importance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationImportance {
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: NotificationImportance,
}

/// The capture-in-progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i32,
    pub channel_id: String,
    pub title: String,
    pub text: String,
    /// Cannot be dismissed by the user while set
    pub ongoing: bool,
    pub importance: NotificationImportance,
}
