use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Foreman head-count allowance of one leader.
///
/// The row is registered by an administrator before the leader account
/// exists (keyed by `leader_username`) and linked to the account once it is
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderQuota {
    pub id: i64,
    pub leader_name: String,
    pub leader_username: String,
    pub leader_user_id: Option<i64>,
    pub max_foreman: i64,
    pub current_foreman_count: i64,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LeaderQuota {
    pub fn can_add_foreman(&self) -> bool {
        self.is_active && self.current_foreman_count < self.max_foreman
    }

    pub fn available_slots(&self) -> i64 {
        (self.max_foreman - self.current_foreman_count).max(0)
    }
}
