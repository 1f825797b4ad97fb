use crate::model::choices::{Department, Role, Shift};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An account. Foremen point at their leader through `leader_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub nrp: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub role: Role,
    pub department: Option<Department>,
    pub leader_id: Option<i64>,
    pub shift: Shift,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Name shown on pages and printed forms: the full name when set, then
    /// first + last name, then the username.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let joined = format!("{} {}", self.first_name, self.last_name);
        let joined = joined.trim();
        if joined.is_empty() {
            self.username.clone()
        } else {
            joined.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user() -> User {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        User {
            id: 1,
            username: "eko_foreman".into(),
            email: "eko@company.com".into(),
            first_name: String::new(),
            last_name: String::new(),
            name: None,
            phone: None,
            nrp: None,
            telegram_chat_id: None,
            role: Role::Foreman,
            department: None,
            leader_id: None,
            shift: Shift::First,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(user().display_name(), "eko_foreman");
    }

    #[test]
    fn display_name_prefers_full_name() {
        let mut u = user();
        u.first_name = "Eko".into();
        u.last_name = "Prasetyo".into();
        assert_eq!(u.display_name(), "Eko Prasetyo");
        u.name = Some("Eko Foreman".into());
        assert_eq!(u.display_name(), "Eko Foreman");
    }
}
