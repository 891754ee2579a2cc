use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Notification type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    /// User started following
    Follow,
    /// User liked a post
    Like,
    /// User commented on a post
    Comment,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Follow => "follow",
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationType::Follow),
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// Stored notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    pub kind: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification about to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewNotification {
    pub from: Uuid,
    pub to: Uuid,
    pub kind: NotificationType,
}

/// Sender identity shown next to a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSender {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub profile_img: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// `None` once the sender's account is gone
    pub from: Option<NotificationSender>,
    pub to: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
