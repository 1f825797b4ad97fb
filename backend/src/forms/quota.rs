//! Leader quota registration form.

use crate::error::AppError;
use crate::store::quotas::{self, QuotaRecord};
use crate::store::users;
use crate::web::form::FormData;
use chrono::NaiveDateTime;
use common::model::choices::Role;
use common::model::quota::LeaderQuota;
use rusqlite::Connection;

#[derive(Debug, Clone, Default)]
pub struct QuotaForm {
    pub leader_name: String,
    pub leader_username: String,
    pub max_foreman: Option<i64>,
    pub is_active: bool,
}

impl QuotaForm {
    pub fn parse(form: &FormData) -> Self {
        Self {
            leader_name: form.text("leader_name"),
            leader_username: form.text("leader_username"),
            max_foreman: form.int("max_foreman"),
            is_active: form.checkbox("is_active"),
        }
    }

    pub fn from_quota(quota: &LeaderQuota) -> Self {
        Self {
            leader_name: quota.leader_name.clone(),
            leader_username: quota.leader_username.clone(),
            max_foreman: Some(quota.max_foreman),
            is_active: quota.is_active,
        }
    }

    /// Checks every field and returns all problems at once.
    pub fn validate(
        &self,
        conn: &Connection,
        existing: Option<&LeaderQuota>,
    ) -> Result<QuotaRecord, AppError> {
        let mut errors = Vec::new();
        if self.leader_name.is_empty() {
            errors.push("Nama leader wajib diisi.".to_owned());
        }
        if self.leader_username.is_empty() {
            errors.push("Username leader wajib diisi.".to_owned());
        } else {
            if quotas::username_in_other_quota(conn, &self.leader_username, existing.map(|q| q.id))? {
                errors.push("Username ini sudah terdaftar di kuota leader lain.".to_owned());
            }
            let used_by_other_role = users::find_by_username(conn, &self.leader_username)?
                .is_some_and(|u| u.role != Role::Leader);
            if used_by_other_role {
                errors.push("Username ini sudah digunakan oleh user lain.".to_owned());
            }
        }
        match self.max_foreman {
            None => errors.push("Maksimal mekanik wajib diisi.".to_owned()),
            Some(max) if max < 0 => {
                errors.push("Maksimal mekanik tidak boleh negatif.".to_owned())
            }
            Some(max) => {
                if let Some(quota) = existing {
                    if max < quota.current_foreman_count {
                        errors.push(format!(
                            "Maksimal mekanik tidak boleh kurang dari jumlah mekanik saat ini ({}).",
                            quota.current_foreman_count
                        ));
                    }
                }
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(QuotaRecord {
            leader_name: self.leader_name.clone(),
            leader_username: self.leader_username.clone(),
            max_foreman: self.max_foreman.unwrap_or_default(),
            is_active: self.is_active,
        })
    }
}

/// Creates or updates a quota from the form. Returns the quota id.
pub fn save_quota(
    conn: &Connection,
    form: &QuotaForm,
    existing: Option<&LeaderQuota>,
    now: NaiveDateTime,
) -> Result<i64, AppError> {
    let record = form.validate(conn, existing)?;
    match existing {
        Some(quota) => {
            quotas::update(conn, quota.id, &record, now)?;
            if let Some(user) = users::find_by_username(conn, &record.leader_username)? {
                if quota.leader_user_id != Some(user.id) {
                    quotas::link_leader(conn, quota.id, user.id, now)?;
                }
            }
            if let Some(updated) = quotas::find_by_id(conn, quota.id)? {
                quotas::update_foreman_count(conn, &updated, now)?;
            }
            Ok(quota.id)
        }
        None => quotas::insert(conn, &record, now),
    }
}
