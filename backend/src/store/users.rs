use crate::db::{parse_col, parse_opt_col, shift_col};
use crate::error::AppError;
use chrono::NaiveDateTime;
use common::model::choices::{Department, Role, Shift};
use common::model::user::User;
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, name, phone, nrp, \
     telegram_chat_id, role, department, leader_id, shift, is_active, created_at, updated_at";

/// Editable fields of an account. `password_hash` is only read on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
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
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        name: row.get("name")?,
        phone: row.get("phone")?,
        nrp: row.get("nrp")?,
        telegram_chat_id: row.get("telegram_chat_id")?,
        role: parse_col(row, "role")?,
        department: parse_opt_col(row, "department")?,
        leader_id: row.get("leader_id")?,
        shift: shift_col(row, "shift")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn query_users(
    conn: &Connection,
    where_clause: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<User>, AppError> {
    let sql = format!("SELECT {} FROM users {}", USER_COLUMNS, where_clause);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(params, map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_user).optional()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<User, AppError> {
    find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("User"))
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [username], map_user).optional()?)
}

/// The account together with its stored password hash, for login.
pub fn find_credentials(
    conn: &Connection,
    username: &str,
) -> Result<Option<(User, String)>, AppError> {
    let sql = format!(
        "SELECT {}, password_hash FROM users WHERE username = ?1",
        USER_COLUMNS
    );
    Ok(conn
        .query_row(&sql, [username], |row| {
            Ok((map_user(row)?, row.get::<_, String>("password_hash")?))
        })
        .optional()?)
}

pub fn username_taken(
    conn: &Connection,
    username: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1 AND id IS NOT ?2",
        params![username, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn email_taken(
    conn: &Connection,
    email: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 AND id IS NOT ?2",
        params![email, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert(conn: &Connection, user: &NewUser, now: NaiveDateTime) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, name, phone, \
         nrp, telegram_chat_id, role, department, leader_id, shift, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
        params![
            user.username,
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.name,
            user.phone,
            user.nrp,
            user.telegram_chat_id,
            user.role.as_str(),
            user.department.map(|d| d.as_str()),
            user.leader_id,
            user.shift.as_i64(),
            user.is_active,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rewrites the profile of `id`. The password changes only when a new hash is given.
pub fn update(
    conn: &Connection,
    id: i64,
    user: &NewUser,
    new_password_hash: Option<&str>,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let changed = conn.execute(
        "UPDATE users SET username = ?1, email = ?2, first_name = ?3, last_name = ?4, name = ?5, \
         phone = ?6, nrp = ?7, telegram_chat_id = ?8, role = ?9, department = ?10, leader_id = ?11, \
         shift = ?12, is_active = ?13, updated_at = ?14, \
         password_hash = COALESCE(?15, password_hash) WHERE id = ?16",
        params![
            user.username,
            user.email,
            user.first_name,
            user.last_name,
            user.name,
            user.phone,
            user.nrp,
            user.telegram_chat_id,
            user.role.as_str(),
            user.department.map(|d| d.as_str()),
            user.leader_id,
            user.shift.as_i64(),
            user.is_active,
            now,
            new_password_hash,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::not_found("User"));
    }
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(())
}

pub fn record_login(conn: &Connection, id: i64, now: NaiveDateTime) -> Result<(), AppError> {
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    Ok(())
}

pub fn set_shift(conn: &Connection, id: i64, shift: Shift, now: NaiveDateTime) -> Result<(), AppError> {
    conn.execute(
        "UPDATE users SET shift = ?1, updated_at = ?2 WHERE id = ?3",
        params![shift.as_i64(), now, id],
    )?;
    Ok(())
}

/// Clears the leader link of every foreman of `leader_id`.
pub fn detach_foremen(conn: &Connection, leader_id: i64) -> Result<usize, AppError> {
    Ok(conn.execute(
        "UPDATE users SET leader_id = NULL WHERE leader_id = ?1",
        [leader_id],
    )?)
}

/// Newest accounts first.
pub fn list_all(conn: &Connection) -> Result<Vec<User>, AppError> {
    query_users(conn, "ORDER BY created_at DESC, id DESC", [])
}

/// Ordered by role then display name, as in the user export.
pub fn list_for_export(conn: &Connection) -> Result<Vec<User>, AppError> {
    query_users(
        conn,
        "ORDER BY role, COALESCE(NULLIF(name, ''), username)",
        [],
    )
}

pub fn list_by_role(conn: &Connection, role: Role, active_only: bool) -> Result<Vec<User>, AppError> {
    query_users(
        conn,
        "WHERE role = ?1 AND (is_active = 1 OR ?2 = 0) ORDER BY COALESCE(NULLIF(name, ''), username)",
        params![role.as_str(), active_only],
    )
}

/// All foremen ordered by id; the shift rotation depends on this order.
pub fn foremen_by_id(conn: &Connection) -> Result<Vec<User>, AppError> {
    query_users(conn, "WHERE role = 'foreman' ORDER BY id", [])
}

pub fn active_foremen_on_shift(conn: &Connection, shift: Shift) -> Result<Vec<User>, AppError> {
    query_users(
        conn,
        "WHERE role = 'foreman' AND is_active = 1 AND shift = ?1 ORDER BY id",
        [shift.as_i64()],
    )
}

pub fn foremen_of(conn: &Connection, leader_id: i64) -> Result<Vec<User>, AppError> {
    query_users(
        conn,
        "WHERE role = 'foreman' AND leader_id = ?1 ORDER BY COALESCE(NULLIF(name, ''), username)",
        [leader_id],
    )
}

pub fn find_many(conn: &Connection, ids: &[i64]) -> Result<Vec<User>, AppError> {
    let mut users = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(user) = find_by_id(conn, *id)? {
            users.push(user);
        }
    }
    Ok(users)
}

pub fn count_all(conn: &Connection) -> Result<i64, AppError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}

pub fn count_by_role(conn: &Connection, role: Role) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        [role.as_str()],
        |row| row.get(0),
    )?)
}

/// Active foremen currently assigned to `leader_id`.
pub fn count_active_foremen(conn: &Connection, leader_id: i64) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'foreman' AND is_active = 1 AND leader_id = ?1",
        [leader_id],
        |row| row.get(0),
    )?)
}
