use crate::db::shift_col;
use crate::error::AppError;
use chrono::{NaiveDate, NaiveDateTime};
use common::model::choices::Shift;
use common::model::shift::ShiftSchedule;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn map_schedule(row: &Row<'_>) -> rusqlite::Result<ShiftSchedule> {
    Ok(ShiftSchedule {
        id: row.get("id")?,
        date: row.get("date")?,
        foreman_id: row.get("foreman_id")?,
        shift: shift_col(row, "shift")?,
        department: row.get("department")?,
        notes: row.get("notes")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
    })
}

/// Whether the upsert inserted a new row or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

pub fn find(
    conn: &Connection,
    date: NaiveDate,
    foreman_id: i64,
) -> Result<Option<ShiftSchedule>, AppError> {
    Ok(conn
        .query_row(
            "SELECT id, date, foreman_id, shift, department, notes, is_active, created_at \
             FROM shift_schedules WHERE date = ?1 AND foreman_id = ?2",
            params![date, foreman_id],
            map_schedule,
        )
        .optional()?)
}

/// Writes the plan for `(date, foreman_id)`, reactivating an existing row.
pub fn upsert(
    conn: &Connection,
    date: NaiveDate,
    foreman_id: i64,
    shift: Shift,
    department: &str,
    notes: &str,
    now: NaiveDateTime,
) -> Result<Upserted, AppError> {
    let existed = find(conn, date, foreman_id)?.is_some();
    conn.execute(
        "INSERT INTO shift_schedules (date, foreman_id, shift, department, notes, is_active, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6) \
         ON CONFLICT (date, foreman_id) DO UPDATE SET shift = excluded.shift, \
         department = excluded.department, notes = excluded.notes, is_active = 1",
        params![date, foreman_id, shift.as_i64(), department, notes, now],
    )?;
    Ok(if existed {
        Upserted::Updated
    } else {
        Upserted::Created
    })
}

/// Active plans for `date`.
pub fn active_on(conn: &Connection, date: NaiveDate) -> Result<Vec<ShiftSchedule>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, foreman_id, shift, department, notes, is_active, created_at \
         FROM shift_schedules WHERE date = ?1 AND is_active = 1 ORDER BY foreman_id",
    )?;
    let rows = stmt
        .query_map([date], map_schedule)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_user, memory_conn};
    use common::model::choices::Role;

    #[test]
    fn upsert_reports_create_then_update() {
        let conn = memory_conn();
        let foreman = insert_user(&conn, "mek", Role::Foreman);
        let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();

        let first = upsert(&conn, day, foreman.id, Shift::First, "mechanic", "n", now()).unwrap();
        let second = upsert(&conn, day, foreman.id, Shift::Off, "mechanic", "n", now()).unwrap();

        assert_eq!(first, Upserted::Created);
        assert_eq!(second, Upserted::Updated);
        let plans = active_on(&conn, day).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].shift, Shift::Off);
    }
}
