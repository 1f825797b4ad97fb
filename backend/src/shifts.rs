//! # Shift planning
//!
//! Weekly rotation generation and the daily job copying today's plan onto
//! each foreman's live shift.

use crate::error::AppError;
use crate::store::shifts::{self, Upserted};
use crate::store::users;
use chrono::{Days, NaiveDate, NaiveDateTime};
use common::model::shift::rotation_shift;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

pub const AUTO_GENERATED_NOTE: &str = "Auto-generated";
pub const DEFAULT_DEPARTMENT: &str = "mechanic";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratedWeek {
    pub created: usize,
    pub updated: usize,
}

/// Plans `days` days from `start` for every foreman, rotating
/// Shift 1, Shift 2, Stop by foreman position and day offset.
pub fn generate_shift_week(
    conn: &Connection,
    start: NaiveDate,
    days: u32,
    department: &str,
    now: NaiveDateTime,
) -> Result<GeneratedWeek, AppError> {
    let foremen = users::foremen_by_id(conn)?;
    let tx = conn.unchecked_transaction()?;
    let mut result = GeneratedWeek::default();
    for offset in 0..days {
        let Some(date) = start.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        for (index, foreman) in foremen.iter().enumerate() {
            let shift = rotation_shift(index, offset as usize);
            match shifts::upsert(&tx, date, foreman.id, shift, department, AUTO_GENERATED_NOTE, now)? {
                Upserted::Created => result.created += 1,
                Upserted::Updated => result.updated += 1,
            }
        }
    }
    tx.commit()?;
    info!(
        "Shift week from {}: {} created, {} updated",
        start, result.created, result.updated
    );
    Ok(result)
}

/// Copies today's active plans onto `users.shift`. Returns how many users changed.
pub fn apply_today_shifts(
    conn: &Connection,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<usize, AppError> {
    let tx = conn.unchecked_transaction()?;
    let mut updated = 0;
    for plan in shifts::active_on(&tx, today)? {
        let Some(user) = users::find_by_id(&tx, plan.foreman_id)? else {
            continue;
        };
        if user.shift != plan.shift {
            users::set_shift(&tx, user.id, plan.shift, now)?;
            updated += 1;
        }
    }
    tx.commit()?;
    info!("Applied shift plan for {}: {} users updated", today, updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use common::model::choices::{Role, Shift};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[test]
    fn week_has_one_row_per_foreman_per_day() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let a = insert_foreman(&conn, "a", leader.id, Shift::First);
        let b = insert_foreman(&conn, "b", leader.id, Shift::First);

        let week = generate_shift_week(&conn, day(1), 7, DEFAULT_DEPARTMENT, now()).unwrap();
        assert_eq!(week, GeneratedWeek { created: 14, updated: 0 });

        assert_eq!(shifts::find(&conn, day(1), a.id).unwrap().unwrap().shift, Shift::First);
        assert_eq!(shifts::find(&conn, day(1), b.id).unwrap().unwrap().shift, Shift::Second);
        assert_eq!(shifts::find(&conn, day(3), a.id).unwrap().unwrap().shift, Shift::Off);
        assert_eq!(shifts::find(&conn, day(4), a.id).unwrap().unwrap().shift, Shift::First);
        let plan = shifts::find(&conn, day(2), b.id).unwrap().unwrap();
        assert_eq!(plan.notes.as_deref(), Some(AUTO_GENERATED_NOTE));

        let again = generate_shift_week(&conn, day(1), 7, DEFAULT_DEPARTMENT, now()).unwrap();
        assert_eq!(again, GeneratedWeek { created: 0, updated: 14 });
    }

    #[test]
    fn apply_only_counts_changed_users() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let a = insert_foreman(&conn, "a", leader.id, Shift::First);
        let b = insert_foreman(&conn, "b", leader.id, Shift::First);
        generate_shift_week(&conn, day(1), 1, DEFAULT_DEPARTMENT, now()).unwrap();

        assert_eq!(apply_today_shifts(&conn, day(1), now()).unwrap(), 1);
        assert_eq!(users::get(&conn, a.id).unwrap().shift, Shift::First);
        assert_eq!(users::get(&conn, b.id).unwrap().shift, Shift::Second);
        assert_eq!(apply_today_shifts(&conn, day(1), now()).unwrap(), 0);
        assert_eq!(apply_today_shifts(&conn, day(2), now()).unwrap(), 0);
    }
}
