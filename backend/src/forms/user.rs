//! Account creation, editing and deletion by administrators.
//!
//! The leader/foreman rules live here: a leader account needs a registered
//! quota for its username, and a foreman needs a leader whose quota still
//! has room. Quota counters are recomputed after every change.

use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::store::quotas;
use crate::store::users::{self, NewUser};
use crate::web::form::FormData;
use chrono::NaiveDateTime;
use common::model::choices::{Department, Role, Shift};
use common::model::user::User;
use log::info;
use regex::Regex;
use rusqlite::Connection;
use std::sync::LazyLock;

#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub nrp: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub shift: Option<Shift>,
    pub leader_id: Option<i64>,
    pub is_active: bool,
    pub password1: String,
    pub password2: String,
}

impl UserForm {
    pub fn parse(form: &FormData) -> Self {
        Self {
            username: form.text("username"),
            email: form.text("email"),
            first_name: form.text("first_name"),
            last_name: form.text("last_name"),
            name: form.opt("name"),
            phone: form.opt("phone"),
            nrp: form.opt("nrp"),
            telegram_chat_id: form.opt("telegram_chat_id"),
            role: form.get("role").and_then(|r| r.parse().ok()),
            department: form.get("department").and_then(|d| d.parse().ok()),
            shift: form.int("shift").and_then(|s| Shift::from_i64(s).ok()),
            leader_id: form.int("leader"),
            // New accounts are active unless the edit form unticks the box.
            is_active: form.get("is_active").is_none() || form.checkbox("is_active"),
            password1: form.get("password1").unwrap_or_default().to_owned(),
            password2: form.get("password2").unwrap_or_default().to_owned(),
        }
    }

    fn record(&self, role: Role, leader_id: Option<i64>, password_hash: String) -> NewUser {
        NewUser {
            username: self.username.clone(),
            email: self.email.clone(),
            password_hash,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            nrp: self.nrp.clone(),
            telegram_chat_id: self.telegram_chat_id.clone(),
            role,
            department: self.department,
            leader_id,
            shift: self.shift.unwrap_or(Shift::First),
            is_active: self.is_active,
        }
    }
}

/// Letters, digits and `@ . + - _`, at most 150 characters.
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.@+-]{1,150}$").expect("USERNAME_REGEX: invalid regex pattern")
});

fn check_username_format(username: &str) -> Result<(), AppError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(AppError::validation(
            "Username hanya boleh berisi huruf, angka dan karakter @/./+/-/_.",
        ))
    }
}

fn check_unique(conn: &Connection, form: &UserForm, except_id: Option<i64>) -> Result<(), AppError> {
    check_username_format(&form.username)?;
    if users::username_taken(conn, &form.username, except_id)? {
        return Err(AppError::validation(format!(
            "Username '{}' sudah digunakan.",
            form.username
        )));
    }
    if users::email_taken(conn, &form.email, except_id)? {
        return Err(AppError::validation(format!(
            "Email '{}' sudah digunakan.",
            form.email
        )));
    }
    Ok(())
}

fn check_leader_registration(conn: &Connection, username: &str) -> Result<(), AppError> {
    if quotas::is_username_registered(conn, username)? {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Username '{}' belum terdaftar di kuota leader. Silakan daftarkan terlebih dahulu.",
            username
        )))
    }
}

/// Resolves the chosen leader and checks that its quota has room for one more foreman.
fn check_leader_capacity(conn: &Connection, leader_id: Option<i64>) -> Result<User, AppError> {
    let Some(leader_id) = leader_id else {
        return Err(AppError::validation("Mekanik harus memiliki leader."));
    };
    let leader = users::find_by_id(conn, leader_id)?
        .filter(|u| u.role == Role::Leader)
        .ok_or_else(|| AppError::validation("Leader tidak ditemukan."))?;
    let Some(quota) = quotas::find_for_leader(conn, &leader)? else {
        return Err(AppError::validation(format!(
            "Leader {} tidak memiliki kuota yang terdaftar. Silakan daftarkan kuota terlebih dahulu.",
            leader.display_name()
        )));
    };
    let current = users::count_active_foremen(conn, leader.id)?;
    if current >= quota.max_foreman || !quota.is_active {
        return Err(AppError::validation(format!(
            "Leader {} sudah mencapai batas maksimal mekanik ({}). Saat ini: {}/{}",
            leader.display_name(),
            quota.max_foreman,
            current,
            quota.max_foreman
        )));
    }
    Ok(leader)
}

fn link_quota(conn: &Connection, user: &User, now: NaiveDateTime) -> Result<(), AppError> {
    if let Some(quota) = quotas::get_quota_by_username(conn, &user.username)? {
        quotas::link_leader(conn, quota.id, user.id, now)?;
        let quota = quotas::find_by_id(conn, quota.id)?.unwrap_or(quota);
        quotas::update_foreman_count(conn, &quota, now)?;
    }
    Ok(())
}

/// Creates an account after checking the role rules. Returns the saved user.
pub fn create_user_with_role(
    conn: &Connection,
    form: &UserForm,
    now: NaiveDateTime,
) -> Result<User, AppError> {
    let role = match form.role {
        Some(role) if !form.username.is_empty() && !form.email.is_empty() => role,
        _ => {
            return Err(AppError::validation(
                "Username, email, dan role wajib diisi.",
            ))
        }
    };
    if form.password1 != form.password2 {
        return Err(AppError::validation(
            "Password dan konfirmasi password tidak cocok.",
        ));
    }
    if form.password1.is_empty() {
        return Err(AppError::validation("Password wajib diisi."));
    }
    check_unique(conn, form, None)?;

    let leader_id = match role {
        Role::Leader => {
            check_leader_registration(conn, &form.username)?;
            None
        }
        Role::Foreman => Some(check_leader_capacity(conn, form.leader_id)?.id),
        Role::Admin | Role::Superadmin => None,
    };

    let hash = hash_password(&form.password1)?;
    let tx = conn.unchecked_transaction()?;
    let id = users::insert(&tx, &form.record(role, leader_id, hash), now)?;
    let user = users::get(&tx, id)?;
    match role {
        Role::Leader => link_quota(&tx, &user, now)?,
        Role::Foreman => {
            if let Some(leader_id) = leader_id {
                quotas::refresh_for_leader(&tx, leader_id, now)?;
            }
        }
        Role::Admin | Role::Superadmin => {}
    }
    tx.commit()?;
    info!("Created user {} with role {}", user.username, role);
    Ok(user)
}

/// The new password hash for an edit, `None` when both fields are left blank.
fn edited_password(form: &UserForm) -> Result<Option<String>, AppError> {
    if form.password1.is_empty() && form.password2.is_empty() {
        return Ok(None);
    }
    if form.password1.is_empty() {
        return Err(AppError::validation(
            "Password harus diisi jika ingin mengubah password",
        ));
    }
    if form.password2.is_empty() {
        return Err(AppError::validation("Konfirmasi password harus diisi"));
    }
    if form.password1 != form.password2 {
        return Err(AppError::validation("Password tidak cocok"));
    }
    Ok(Some(hash_password(&form.password1)?))
}

/// Saves the edit form over `existing`.
pub fn update_user(
    conn: &Connection,
    existing: &User,
    form: &UserForm,
    now: NaiveDateTime,
) -> Result<User, AppError> {
    if form.username.is_empty() || form.email.is_empty() {
        return Err(AppError::validation(
            "Username, email, dan role wajib diisi.",
        ));
    }
    let role = form.role.unwrap_or(existing.role);
    check_unique(conn, form, Some(existing.id))?;
    let password_hash = edited_password(form)?;

    let leader_id = match role {
        Role::Foreman => {
            let unchanged = existing.role == Role::Foreman
                && existing.is_active
                && existing.leader_id.is_some()
                && existing.leader_id == form.leader_id;
            if unchanged {
                form.leader_id
            } else {
                Some(check_leader_capacity(conn, form.leader_id)?.id)
            }
        }
        Role::Leader => {
            if existing.role != Role::Leader || existing.username != form.username {
                check_leader_registration(conn, &form.username)?;
            }
            None
        }
        Role::Admin | Role::Superadmin => None,
    };

    let tx = conn.unchecked_transaction()?;
    users::update(
        &tx,
        existing.id,
        &form.record(role, leader_id, String::new()),
        password_hash.as_deref(),
        now,
    )?;
    let updated = users::get(&tx, existing.id)?;
    if existing.role == Role::Leader && role != Role::Leader {
        users::detach_foremen(&tx, existing.id)?;
        quotas::unlink_leader(&tx, existing.id, now)?;
    }
    if role == Role::Leader {
        link_quota(&tx, &updated, now)?;
    }
    for leader in [existing.leader_id, updated.leader_id].into_iter().flatten() {
        quotas::refresh_for_leader(&tx, leader, now)?;
    }
    tx.commit()?;
    Ok(updated)
}

/// Deletes an account. A foreman's leader quota is decremented and then
/// recomputed; a deleted leader releases its foremen and quota link.
pub fn delete_user(conn: &Connection, user: &User, now: NaiveDateTime) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;
    if user.role == Role::Leader {
        users::detach_foremen(&tx, user.id)?;
        quotas::unlink_leader(&tx, user.id, now)?;
    }
    let leader = match user.leader_id {
        Some(id) => users::find_by_id(&tx, id)?,
        None => None,
    };
    users::delete(&tx, user.id)?;
    if let Some(leader) = leader {
        if let Some(quota) = quotas::find_for_leader(&tx, &leader)? {
            quotas::decrement(&tx, quota.id, now)?;
            if let Some(quota) = quotas::find_by_id(&tx, quota.id)? {
                quotas::update_foreman_count(&tx, &quota, now)?;
            }
        }
    }
    tx.commit()?;
    info!("Deleted user {}", user.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::memory_conn;
    use crate::store::quotas::QuotaRecord;
    use rstest::rstest;

    fn register_quota(conn: &Connection, username: &str, max: i64) -> i64 {
        quotas::insert(
            conn,
            &QuotaRecord {
                leader_name: format!("Leader {}", username),
                leader_username: username.to_owned(),
                max_foreman: max,
                is_active: true,
            },
            now(),
        )
        .unwrap()
    }

    fn form(username: &str, role: Role, leader_id: Option<i64>) -> UserForm {
        UserForm {
            username: username.to_owned(),
            email: format!("{}@rml.test", username),
            name: Some(username.to_uppercase()),
            role: Some(role),
            department: Some(Department::Track),
            shift: Some(Shift::First),
            leader_id,
            is_active: true,
            password1: "rahasia123".into(),
            password2: "rahasia123".into(),
            ..UserForm::default()
        }
    }

    #[rstest]
    #[case("mekanik.01", true)]
    #[case("budi@rml", true)]
    #[case("budi santoso", false)]
    #[case("budi/1", false)]
    fn usernames_follow_the_account_alphabet(#[case] username: &str, #[case] accepted: bool) {
        assert_eq!(check_username_format(username).is_ok(), accepted);
    }

    #[rstest]
    #[case(150, true)]
    #[case(151, false)]
    #[case(0, false)]
    fn usernames_are_capped_at_150_characters(#[case] length: usize, #[case] accepted: bool) {
        let username = "a".repeat(length);
        assert_eq!(check_username_format(&username).is_ok(), accepted);
        assert_eq!(USERNAME_REGEX.is_match(&username), accepted);
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(messages) => messages.join("; "),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn leader_requires_registered_quota_and_gets_linked() {
        let conn = memory_conn();
        let err = create_user_with_role(&conn, &form("budi", Role::Leader, None), now()).unwrap_err();
        assert!(message(err).contains("belum terdaftar di kuota leader"));

        let quota_id = register_quota(&conn, "budi", 2);
        let leader = create_user_with_role(&conn, &form("budi", Role::Leader, None), now()).unwrap();
        let quota = quotas::find_by_id(&conn, quota_id).unwrap().unwrap();
        assert_eq!(quota.leader_user_id, Some(leader.id));
    }

    #[test]
    fn quota_never_exceeds_maximum() {
        let conn = memory_conn();
        let quota_id = register_quota(&conn, "lead", 2);
        let leader = create_user_with_role(&conn, &form("lead", Role::Leader, None), now()).unwrap();

        for name in ["m1", "m2"] {
            create_user_with_role(&conn, &form(name, Role::Foreman, Some(leader.id)), now()).unwrap();
        }
        let err = create_user_with_role(&conn, &form("m3", Role::Foreman, Some(leader.id)), now())
            .unwrap_err();
        assert!(message(err).contains("sudah mencapai batas maksimal mekanik (2). Saat ini: 2/2"));

        let quota = quotas::find_by_id(&conn, quota_id).unwrap().unwrap();
        assert_eq!(quota.current_foreman_count, 2);
        assert!(!quota.can_add_foreman());
    }

    #[rstest::rstest]
    #[case(None, "Mekanik harus memiliki leader.")]
    #[case(Some(999), "Leader tidak ditemukan.")]
    fn foreman_needs_an_existing_leader(#[case] leader_id: Option<i64>, #[case] expected: &str) {
        let conn = memory_conn();
        let err = create_user_with_role(&conn, &form("m", Role::Foreman, leader_id), now()).unwrap_err();
        assert_eq!(message(err), expected);
    }

    #[test]
    fn duplicate_username_and_password_mismatch_are_reported() {
        let conn = memory_conn();
        create_user_with_role(&conn, &form("admin2", Role::Admin, None), now()).unwrap();
        let err = create_user_with_role(&conn, &form("admin2", Role::Admin, None), now()).unwrap_err();
        assert_eq!(message(err), "Username 'admin2' sudah digunakan.");

        let mut mismatch = form("other", Role::Admin, None);
        mismatch.password2 = "beda".into();
        let err = create_user_with_role(&conn, &mismatch, now()).unwrap_err();
        assert_eq!(message(err), "Password dan konfirmasi password tidak cocok.");
    }

    #[test]
    fn non_foreman_never_keeps_a_leader() {
        let conn = memory_conn();
        register_quota(&conn, "lead", 3);
        let leader = create_user_with_role(&conn, &form("lead", Role::Leader, None), now()).unwrap();
        let admin =
            create_user_with_role(&conn, &form("adm", Role::Admin, Some(leader.id)), now()).unwrap();
        assert_eq!(admin.leader_id, None);
    }

    #[test]
    fn moving_foreman_recounts_both_leaders() {
        let conn = memory_conn();
        let q1 = register_quota(&conn, "l1", 2);
        let q2 = register_quota(&conn, "l2", 2);
        let l1 = create_user_with_role(&conn, &form("l1", Role::Leader, None), now()).unwrap();
        let l2 = create_user_with_role(&conn, &form("l2", Role::Leader, None), now()).unwrap();
        let foreman = create_user_with_role(&conn, &form("m", Role::Foreman, Some(l1.id)), now()).unwrap();

        let mut edit = form("m", Role::Foreman, Some(l2.id));
        edit.password1.clear();
        edit.password2.clear();
        let moved = update_user(&conn, &foreman, &edit, now()).unwrap();

        assert_eq!(moved.leader_id, Some(l2.id));
        assert_eq!(quotas::find_by_id(&conn, q1).unwrap().unwrap().current_foreman_count, 0);
        assert_eq!(quotas::find_by_id(&conn, q2).unwrap().unwrap().current_foreman_count, 1);
    }

    #[test]
    fn edit_password_needs_both_fields() {
        let conn = memory_conn();
        let admin = create_user_with_role(&conn, &form("adm", Role::Admin, None), now()).unwrap();
        let mut edit = form("adm", Role::Admin, None);
        edit.password2.clear();
        let err = update_user(&conn, &admin, &edit, now()).unwrap_err();
        assert_eq!(message(err), "Konfirmasi password harus diisi");
    }

    #[test]
    fn deleting_foreman_frees_a_slot() {
        let conn = memory_conn();
        let quota_id = register_quota(&conn, "lead", 1);
        let leader = create_user_with_role(&conn, &form("lead", Role::Leader, None), now()).unwrap();
        let foreman =
            create_user_with_role(&conn, &form("m", Role::Foreman, Some(leader.id)), now()).unwrap();

        delete_user(&conn, &foreman, now()).unwrap();
        let quota = quotas::find_by_id(&conn, quota_id).unwrap().unwrap();
        assert_eq!(quota.current_foreman_count, 0);
        create_user_with_role(&conn, &form("m2", Role::Foreman, Some(leader.id)), now()).unwrap();
    }

    #[test]
    fn deleting_leader_releases_quota() {
        let conn = memory_conn();
        let quota_id = register_quota(&conn, "lead", 2);
        let leader = create_user_with_role(&conn, &form("lead", Role::Leader, None), now()).unwrap();
        let foreman =
            create_user_with_role(&conn, &form("m", Role::Foreman, Some(leader.id)), now()).unwrap();

        delete_user(&conn, &leader, now()).unwrap();
        let quota = quotas::find_by_id(&conn, quota_id).unwrap().unwrap();
        assert_eq!(quota.leader_user_id, None);
        assert_eq!(quota.current_foreman_count, 0);
        assert_eq!(users::get(&conn, foreman.id).unwrap().leader_id, None);
    }
}
