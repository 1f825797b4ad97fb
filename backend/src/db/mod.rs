//! # Database
//!
//! A single SQLite connection guarded by a mutex. The web server shares one
//! `Database` across workers as `web::Data`; the scheduler binaries open their
//! own. Cross-process writes are serialised by SQLite itself.
//!
//! The schema in `schema.sql` is applied idempotently every time a database is
//! opened.

use crate::error::AppError;
use chrono::{Local, NaiveDateTime, Timelike};
use common::model::choices::Shift;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Locks the connection for the duration of the returned guard.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        Ok(self.conn.lock()?)
    }
}

/// Applies pragmas and the schema to a fresh connection.
pub fn initialize(conn: &Connection) -> Result<(), AppError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Local wall-clock time truncated to whole seconds, as stored in `created_at` columns.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

/// Reads a text column holding one of the choice enums.
pub fn parse_col<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column)?;
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, Type::Text, e))
}

/// Like [`parse_col`] for nullable columns; blank text reads as `None`.
pub fn parse_opt_col<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column)?;
    let raw: Option<String> = row.get(idx)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| conversion_error(idx, Type::Text, e)),
    }
}

pub fn shift_col(row: &Row<'_>, column: &str) -> rusqlite::Result<Shift> {
    let idx = row.as_ref().column_index(column)?;
    let raw: i64 = row.get(idx)?;
    Shift::from_i64(raw).map_err(|e| conversion_error(idx, Type::Integer, e))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the unit tests of the store and domain modules.

    use super::*;
    use crate::store::users::{self, NewUser};
    use common::model::choices::{Department, Role};
    use common::model::user::User;

    pub fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory database");
        initialize(&conn).expect("schema");
        conn
    }

    pub fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_owned(),
            email: format!("{}@rml.test", username),
            password_hash: "not-a-hash".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            name: Some(format!("{} name", username)),
            phone: None,
            nrp: Some(format!("NRP-{}", username)),
            telegram_chat_id: None,
            role,
            department: Some(Department::Track),
            leader_id: None,
            shift: Shift::First,
            is_active: true,
        }
    }

    pub fn insert_user(conn: &Connection, username: &str, role: Role) -> User {
        let id = users::insert(conn, &new_user(username, role), now()).expect("insert user");
        users::find_by_id(conn, id)
            .expect("load user")
            .expect("user exists")
    }

    pub fn insert_foreman(conn: &Connection, username: &str, leader_id: i64, shift: Shift) -> User {
        let mut record = new_user(username, Role::Foreman);
        record.leader_id = Some(leader_id);
        record.shift = shift;
        let id = users::insert(conn, &record, now()).expect("insert foreman");
        users::find_by_id(conn, id)
            .expect("load foreman")
            .expect("foreman exists")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_twice() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 7);
    }

    #[test]
    fn now_has_no_fraction() {
        assert_eq!(now().nanosecond(), 0);
    }
}
