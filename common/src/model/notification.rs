use crate::model::choices::ParseChoiceError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ActivityReminder,
    AnalysisReminder,
    ManualMessage,
    SystemAlert,
    DeadlineWarning,
}

impl NotificationType {
    pub const ALL: [NotificationType; 5] = [
        NotificationType::ActivityReminder,
        NotificationType::AnalysisReminder,
        NotificationType::ManualMessage,
        NotificationType::SystemAlert,
        NotificationType::DeadlineWarning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ActivityReminder => "activity_reminder",
            NotificationType::AnalysisReminder => "analysis_reminder",
            NotificationType::ManualMessage => "manual_message",
            NotificationType::SystemAlert => "system_alert",
            NotificationType::DeadlineWarning => "deadline_warning",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::ActivityReminder => "Pengingat Activity Report",
            NotificationType::AnalysisReminder => "Pengingat Analysis Report",
            NotificationType::ManualMessage => "Pesan Manual",
            NotificationType::SystemAlert => "Peringatan Sistem",
            NotificationType::DeadlineWarning => "Peringatan Deadline",
        }
    }
}

impl FromStr for NotificationType {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseChoiceError {
                kind: "notification type",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseChoiceError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
    Acknowledged,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "unread",
            NotificationStatus::Read => "read",
            NotificationStatus::Acknowledged => "acknowledged",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(NotificationStatus::Unread),
            "read" => Ok(NotificationStatus::Read),
            "acknowledged" => Ok(NotificationStatus::Acknowledged),
            other => Err(ParseChoiceError {
                kind: "notification status",
                value: other.to_string(),
            }),
        }
    }
}

/// A message addressed to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub created_by_id: Option<i64>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub status: NotificationStatus,
    pub is_manual: bool,
    pub requires_acknowledgment: bool,
    pub auto_remove_on_completion: bool,
    pub created_at: NaiveDateTime,
    pub read_at: Option<NaiveDateTime>,
    pub acknowledged_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.status == NotificationStatus::Unread
    }
}

/// Row shape of the polling endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSummary {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub created_at: String,
    pub is_unread: bool,
}

impl From<&Notification> for NotificationSummary {
    fn from(n: &Notification) -> Self {
        NotificationSummary {
            id: n.id,
            title: n.title.clone(),
            message: n.message.clone(),
            notification_type: n.notification_type,
            priority: n.priority,
            created_at: n.created_at.format("%d/%m/%Y %H:%M").to_string(),
            is_unread: n.is_unread(),
        }
    }
}
