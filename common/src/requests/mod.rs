use crate::model::notification::{NotificationSummary, Priority};
use serde::{Deserialize, Serialize};

/// Body of the leader quota lookup.
#[derive(Debug, Deserialize)]
pub struct CheckLeaderQuotaRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct QuotaInfo {
    pub leader_name: String,
    pub max_foreman: i64,
    pub current_count: i64,
    pub available_slots: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CheckLeaderQuotaResponse {
    pub is_registered: bool,
    pub quota_info: Option<QuotaInfo>,
    pub message: String,
}

/// Query string shared by the report lists and the exports.
///
/// Empty strings are treated as absent so that blank form fields do not filter.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub foreman: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MarkReadResponse {
    pub success: bool,
    pub unread_count: i64,
    pub message: String,
}

/// Body of the notification polling endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationFeed {
    pub unread_count: i64,
    pub notifications: Vec<NotificationSummary>,
}

/// Admin broadcast form.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomNotificationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub user_ids: Vec<i64>,
    #[serde(default)]
    pub requires_acknowledgment: bool,
}

/// Answer of the admin reminder and broadcast endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_ids: Vec<i64>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            notification_id: None,
            notification_ids: Vec::new(),
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::ok(message)
        }
    }
}
