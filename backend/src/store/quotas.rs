use crate::error::AppError;
use crate::store::users;
use chrono::NaiveDateTime;
use common::model::quota::LeaderQuota;
use common::model::user::User;
use rusqlite::{params, Connection, OptionalExtension, Row};

const QUOTA_COLUMNS: &str = "id, leader_name, leader_username, leader_user_id, max_foreman, \
     current_foreman_count, is_active, created_at, updated_at";

/// Fields an administrator edits on the quota form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaRecord {
    pub leader_name: String,
    pub leader_username: String,
    pub max_foreman: i64,
    pub is_active: bool,
}

fn map_quota(row: &Row<'_>) -> rusqlite::Result<LeaderQuota> {
    Ok(LeaderQuota {
        id: row.get("id")?,
        leader_name: row.get("leader_name")?,
        leader_username: row.get("leader_username")?,
        leader_user_id: row.get("leader_user_id")?,
        max_foreman: row.get("max_foreman")?,
        current_foreman_count: row.get("current_foreman_count")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn query_one(
    conn: &Connection,
    where_clause: &str,
    params: impl rusqlite::Params,
) -> Result<Option<LeaderQuota>, AppError> {
    let sql = format!(
        "SELECT {} FROM leader_quotas {} LIMIT 1",
        QUOTA_COLUMNS, where_clause
    );
    Ok(conn.query_row(&sql, params, map_quota).optional()?)
}

pub fn list_all(conn: &Connection) -> Result<Vec<LeaderQuota>, AppError> {
    let sql = format!(
        "SELECT {} FROM leader_quotas ORDER BY leader_name",
        QUOTA_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let quotas = stmt
        .query_map([], map_quota)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quotas)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<LeaderQuota>, AppError> {
    query_one(conn, "WHERE id = ?1", [id])
}

/// Active quota registered for `username`.
pub fn get_quota_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<LeaderQuota>, AppError> {
    query_one(
        conn,
        "WHERE leader_username = ?1 AND is_active = 1",
        [username],
    )
}

pub fn is_username_registered(conn: &Connection, username: &str) -> Result<bool, AppError> {
    Ok(get_quota_by_username(conn, username)?.is_some())
}

/// Quota row of a leader account, linked or still keyed by username.
pub fn find_for_leader(conn: &Connection, leader: &User) -> Result<Option<LeaderQuota>, AppError> {
    query_one(
        conn,
        "WHERE leader_user_id = ?1 OR (leader_user_id IS NULL AND leader_username = ?2) \
         ORDER BY leader_user_id IS NULL",
        params![leader.id, leader.username],
    )
}

pub fn username_in_other_quota(
    conn: &Connection,
    username: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM leader_quotas WHERE leader_username = ?1 AND id IS NOT ?2",
        params![username, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert(conn: &Connection, quota: &QuotaRecord, now: NaiveDateTime) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO leader_quotas (leader_name, leader_username, max_foreman, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            quota.leader_name,
            quota.leader_username,
            quota.max_foreman,
            quota.is_active,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();
    if let Some(user) = users::find_by_username(conn, &quota.leader_username)? {
        link_leader(conn, id, user.id, now)?;
    }
    Ok(id)
}

pub fn update(
    conn: &Connection,
    id: i64,
    quota: &QuotaRecord,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let changed = conn.execute(
        "UPDATE leader_quotas SET leader_name = ?1, leader_username = ?2, max_foreman = ?3, \
         is_active = ?4, updated_at = ?5 WHERE id = ?6",
        params![
            quota.leader_name,
            quota.leader_username,
            quota.max_foreman,
            quota.is_active,
            now,
            id
        ],
    )?;
    if changed == 0 {
        return Err(AppError::not_found("Kuota leader"));
    }
    Ok(())
}

pub fn link_leader(
    conn: &Connection,
    quota_id: i64,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE leader_quotas SET leader_user_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![user_id, now, quota_id],
    )?;
    Ok(())
}

pub fn unlink_leader(conn: &Connection, user_id: i64, now: NaiveDateTime) -> Result<(), AppError> {
    conn.execute(
        "UPDATE leader_quotas SET leader_user_id = NULL, current_foreman_count = 0, updated_at = ?1 \
         WHERE leader_user_id = ?2",
        params![now, user_id],
    )?;
    Ok(())
}

/// Recomputes `current_foreman_count` from the active foremen of the linked
/// leader and stores it. An unlinked quota keeps its stored count.
pub fn update_foreman_count(
    conn: &Connection,
    quota: &LeaderQuota,
    now: NaiveDateTime,
) -> Result<i64, AppError> {
    let Some(leader_id) = quota.leader_user_id else {
        return Ok(quota.current_foreman_count);
    };
    let count = users::count_active_foremen(conn, leader_id)?;
    conn.execute(
        "UPDATE leader_quotas SET current_foreman_count = ?1, updated_at = ?2 WHERE id = ?3",
        params![count, now, quota.id],
    )?;
    Ok(count)
}

/// Recomputes the count of the quota belonging to `leader_id`, if any.
pub fn refresh_for_leader(
    conn: &Connection,
    leader_id: i64,
    now: NaiveDateTime,
) -> Result<Option<i64>, AppError> {
    let Some(leader) = users::find_by_id(conn, leader_id)? else {
        return Ok(None);
    };
    match find_for_leader(conn, &leader)? {
        Some(quota) => Ok(Some(update_foreman_count(conn, &quota, now)?)),
        None => Ok(None),
    }
}

/// Lowers the stored count by one without going below zero.
pub fn decrement(conn: &Connection, quota_id: i64, now: NaiveDateTime) -> Result<(), AppError> {
    conn.execute(
        "UPDATE leader_quotas SET current_foreman_count = MAX(current_foreman_count - 1, 0), \
         updated_at = ?1 WHERE id = ?2",
        params![now, quota_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use common::model::choices::{Role, Shift};
    use rstest::rstest;

    fn record(username: &str, max: i64) -> QuotaRecord {
        QuotaRecord {
            leader_name: format!("Leader {}", username),
            leader_username: username.to_owned(),
            max_foreman: max,
            is_active: true,
        }
    }

    #[test]
    fn registration_only_counts_active_quotas() {
        let conn = memory_conn();
        let id = insert(&conn, &record("rudi", 3), now()).unwrap();
        assert!(is_username_registered(&conn, "rudi").unwrap());

        let mut inactive = record("rudi", 3);
        inactive.is_active = false;
        update(&conn, id, &inactive, now()).unwrap();
        assert!(!is_username_registered(&conn, "rudi").unwrap());
    }

    #[test]
    fn insert_links_existing_leader_account() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "rudi", Role::Leader);
        let id = insert(&conn, &record("rudi", 3), now()).unwrap();
        let quota = find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(quota.leader_user_id, Some(leader.id));
    }

    #[test]
    fn update_foreman_count_recomputes_from_users() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "rudi", Role::Leader);
        let id = insert(&conn, &record("rudi", 2), now()).unwrap();
        insert_foreman(&conn, "m1", leader.id, Shift::First);
        insert_foreman(&conn, "m2", leader.id, Shift::Second);

        let quota = find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(update_foreman_count(&conn, &quota, now()).unwrap(), 2);
        let quota = find_by_id(&conn, id).unwrap().unwrap();
        assert!(!quota.can_add_foreman());
        assert_eq!(quota.available_slots(), 0);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(3, 2)]
    fn decrement_saturates_at_zero(#[case] start: i64, #[case] expected: i64) {
        let conn = memory_conn();
        let id = insert(&conn, &record("rudi", 5), now()).unwrap();
        conn.execute(
            "UPDATE leader_quotas SET current_foreman_count = ?1 WHERE id = ?2",
            params![start, id],
        )
        .unwrap();
        decrement(&conn, id, now()).unwrap();
        assert_eq!(
            find_by_id(&conn, id).unwrap().unwrap().current_foreman_count,
            expected
        );
    }
}
