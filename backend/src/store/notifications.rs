use crate::db::parse_col;
use crate::error::AppError;
use chrono::{NaiveDate, NaiveDateTime};
use common::model::notification::{Notification, NotificationType, Priority};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTIFICATION_COLUMNS: &str = "id, user_id, created_by_id, notification_type, title, message, \
     priority, status, is_manual, requires_acknowledgment, auto_remove_on_completion, created_at, \
     read_at, acknowledged_at, expires_at";

/// A notification about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub created_by_id: Option<i64>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub is_manual: bool,
    pub requires_acknowledgment: bool,
    pub auto_remove_on_completion: bool,
}

impl NewNotification {
    /// System-generated notification with default priority and auto-removal.
    pub fn system(
        recipient_id: i64,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            created_by_id: None,
            notification_type,
            title: title.into(),
            message: message.into(),
            priority: Priority::Medium,
            is_manual: false,
            requires_acknowledgment: false,
            auto_remove_on_completion: true,
        }
    }

    /// Notification sent by an administrator.
    pub fn manual(
        recipient_id: i64,
        sender_id: i64,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
        requires_acknowledgment: bool,
    ) -> Self {
        Self {
            recipient_id,
            created_by_id: Some(sender_id),
            notification_type,
            title: title.into(),
            message: message.into(),
            priority,
            is_manual: true,
            requires_acknowledgment,
            auto_remove_on_completion: true,
        }
    }
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        recipient_id: row.get("user_id")?,
        created_by_id: row.get("created_by_id")?,
        notification_type: parse_col(row, "notification_type")?,
        title: row.get("title")?,
        message: row.get("message")?,
        priority: parse_col(row, "priority")?,
        status: parse_col(row, "status")?,
        is_manual: row.get("is_manual")?,
        requires_acknowledgment: row.get("requires_acknowledgment")?,
        auto_remove_on_completion: row.get("auto_remove_on_completion")?,
        created_at: row.get("created_at")?,
        read_at: row.get("read_at")?,
        acknowledged_at: row.get("acknowledged_at")?,
        expires_at: row.get("expires_at")?,
    })
}

fn query(
    conn: &Connection,
    tail: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Notification>, AppError> {
    let sql = format!("SELECT {} FROM notifications {}", NOTIFICATION_COLUMNS, tail);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_notification)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert(
    conn: &Connection,
    notification: &NewNotification,
    now: NaiveDateTime,
) -> Result<Notification, AppError> {
    conn.execute(
        "INSERT INTO notifications (user_id, created_by_id, notification_type, title, message, \
         priority, status, is_manual, requires_acknowledgment, auto_remove_on_completion, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'unread', ?7, ?8, ?9, ?10)",
        params![
            notification.recipient_id,
            notification.created_by_id,
            notification.notification_type.as_str(),
            notification.title,
            notification.message,
            notification.priority.as_str(),
            notification.is_manual,
            notification.requires_acknowledgment,
            notification.auto_remove_on_completion,
            now,
        ],
    )?;
    get(conn, conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Notification>, AppError> {
    let sql = format!(
        "SELECT {} FROM notifications WHERE id = ?1",
        NOTIFICATION_COLUMNS
    );
    Ok(conn.query_row(&sql, [id], map_notification).optional()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Notification, AppError> {
    find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Notifikasi"))
}

/// Notification `id` if it belongs to `user_id`.
pub fn find_for_user(
    conn: &Connection,
    id: i64,
    user_id: i64,
) -> Result<Option<Notification>, AppError> {
    Ok(find_by_id(conn, id)?.filter(|n| n.recipient_id == user_id))
}

/// Newest first; `limit` of `None` returns everything.
pub fn list_for_user(
    conn: &Connection,
    user_id: i64,
    limit: Option<i64>,
) -> Result<Vec<Notification>, AppError> {
    query(
        conn,
        "WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        params![user_id, limit.unwrap_or(-1)],
    )
}

pub fn unread_count(conn: &Connection, user_id: i64) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND status = 'unread'",
        [user_id],
        |row| row.get(0),
    )?)
}

/// Moves an unread notification to read. Already read ones are left alone.
pub fn mark_as_read(conn: &Connection, id: i64, now: NaiveDateTime) -> Result<bool, AppError> {
    let changed = conn.execute(
        "UPDATE notifications SET status = 'read', read_at = ?1 WHERE id = ?2 AND status = 'unread'",
        params![now, id],
    )?;
    Ok(changed > 0)
}

pub fn mark_all_as_read(conn: &Connection, user_id: i64, now: NaiveDateTime) -> Result<usize, AppError> {
    Ok(conn.execute(
        "UPDATE notifications SET status = 'read', read_at = ?1 WHERE user_id = ?2 AND status = 'unread'",
        params![now, user_id],
    )?)
}

pub fn mark_as_acknowledged(
    conn: &Connection,
    id: i64,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE notifications SET status = 'acknowledged', acknowledged_at = ?1, \
         read_at = COALESCE(read_at, ?1) WHERE id = ?2",
        params![now, id],
    )?;
    Ok(())
}

/// Whether `user_id` already got a notification of `kind` titled `title` on `day`.
pub fn exists_same_day(
    conn: &Connection,
    user_id: i64,
    kind: NotificationType,
    title: &str,
    day: NaiveDate,
) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND notification_type = ?2 \
         AND title = ?3 AND date(created_at) = ?4",
        params![user_id, kind.as_str(), title, day],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Whether `user_id` got any notification of `kind` in `(year, month)`.
pub fn exists_in_month(
    conn: &Connection,
    user_id: i64,
    kind: NotificationType,
    year: i32,
    month: u32,
) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND notification_type = ?2 \
         AND strftime('%Y-%m', created_at) = ?3",
        params![user_id, kind.as_str(), format!("{:04}-{:02}", year, month)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Deletes the auto-removable notifications of `kind` for a user whose task is done.
pub fn remove_completed(
    conn: &Connection,
    user_id: i64,
    kind: NotificationType,
) -> Result<usize, AppError> {
    Ok(conn.execute(
        "DELETE FROM notifications WHERE user_id = ?1 AND notification_type = ?2 \
         AND auto_remove_on_completion = 1",
        params![user_id, kind.as_str()],
    )?)
}

/// Drops notifications past their `expires_at`.
pub fn purge_expired(conn: &Connection, now: NaiveDateTime) -> Result<usize, AppError> {
    Ok(conn.execute(
        "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < ?1",
        [now],
    )?)
}

/// Totals over administrator-sent notifications.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ManualStats {
    pub total_sent: i64,
    pub unread_count: i64,
    pub acknowledged_count: i64,
    pub by_type: Vec<(String, i64)>,
}

pub fn manual_stats(conn: &Connection) -> Result<ManualStats, AppError> {
    let (total_sent, unread_count, acknowledged_count) = conn.query_row(
        "SELECT COUNT(*), \
         COALESCE(SUM(status = 'unread'), 0), \
         COALESCE(SUM(status = 'acknowledged'), 0) \
         FROM notifications WHERE is_manual = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    let mut stmt = conn.prepare(
        "SELECT notification_type, COUNT(*) AS n FROM notifications WHERE is_manual = 1 \
         GROUP BY notification_type ORDER BY n DESC",
    )?;
    let by_type = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ManualStats {
        total_sent,
        unread_count,
        acknowledged_count,
        by_type,
    })
}

pub fn recent_manual(conn: &Connection, limit: i64) -> Result<Vec<Notification>, AppError> {
    query(
        conn,
        "WHERE is_manual = 1 ORDER BY created_at DESC, id DESC LIMIT ?1",
        [limit],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_user, memory_conn};
    use common::model::choices::Role;
    use common::model::notification::NotificationStatus;

    #[test]
    fn mark_as_read_only_moves_unread() {
        let conn = memory_conn();
        let user = insert_user(&conn, "mek", Role::Foreman);
        let n = insert(
            &conn,
            &NewNotification::system(user.id, NotificationType::SystemAlert, "t", "m"),
            now(),
        )
        .unwrap();
        assert_eq!(unread_count(&conn, user.id).unwrap(), 1);
        assert!(mark_as_read(&conn, n.id, now()).unwrap());
        assert!(!mark_as_read(&conn, n.id, now()).unwrap());
        let loaded = get(&conn, n.id).unwrap();
        assert_eq!(loaded.status, NotificationStatus::Read);
        assert!(loaded.read_at.is_some());
        assert_eq!(unread_count(&conn, user.id).unwrap(), 0);
    }

    #[test]
    fn acknowledging_sets_both_timestamps() {
        let conn = memory_conn();
        let user = insert_user(&conn, "mek", Role::Foreman);
        let n = insert(
            &conn,
            &NewNotification::system(user.id, NotificationType::ManualMessage, "t", "m"),
            now(),
        )
        .unwrap();
        mark_as_acknowledged(&conn, n.id, now()).unwrap();
        let loaded = get(&conn, n.id).unwrap();
        assert_eq!(loaded.status, NotificationStatus::Acknowledged);
        assert!(loaded.read_at.is_some() && loaded.acknowledged_at.is_some());
    }

    #[test]
    fn remove_completed_keeps_other_types_and_pinned() {
        let conn = memory_conn();
        let user = insert_user(&conn, "mek", Role::Foreman);
        let kind = NotificationType::ActivityReminder;
        insert(&conn, &NewNotification::system(user.id, kind, "a", "m"), now()).unwrap();
        let mut pinned = NewNotification::system(user.id, kind, "b", "m");
        pinned.auto_remove_on_completion = false;
        insert(&conn, &pinned, now()).unwrap();
        insert(
            &conn,
            &NewNotification::system(user.id, NotificationType::AnalysisReminder, "c", "m"),
            now(),
        )
        .unwrap();

        assert_eq!(remove_completed(&conn, user.id, kind).unwrap(), 1);
        assert_eq!(list_for_user(&conn, user.id, None).unwrap().len(), 2);
    }

    #[test]
    fn manual_stats_ignore_system_notifications() {
        let conn = memory_conn();
        let admin = insert_user(&conn, "admin", Role::Admin);
        let user = insert_user(&conn, "mek", Role::Foreman);
        insert(
            &conn,
            &NewNotification::system(user.id, NotificationType::ActivityReminder, "s", "m"),
            now(),
        )
        .unwrap();
        let sent = insert(
            &conn,
            &NewNotification::manual(
                user.id,
                admin.id,
                NotificationType::ManualMessage,
                "x",
                "y",
                Priority::High,
                true,
            ),
            now(),
        )
        .unwrap();
        mark_as_acknowledged(&conn, sent.id, now()).unwrap();

        let stats = manual_stats(&conn).unwrap();
        assert_eq!(stats.total_sent, 1);
        assert_eq!(stats.unread_count, 0);
        assert_eq!(stats.acknowledged_count, 1);
        assert_eq!(stats.by_type, vec![("manual_message".to_owned(), 1)]);
    }
}
