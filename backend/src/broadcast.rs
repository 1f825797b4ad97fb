//! Notifications sent by administrators: the foreman status monitor, manual
//! and bulk reminders, and custom messages to selected users.

use crate::config::REQUIRED_ANALYSIS_REPORTS;
use crate::error::AppError;
use crate::reminders::{deadline_text, Delivered};
use crate::store::notifications::{self, NewNotification};
use crate::store::{activity, analysis, users};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use common::model::choices::{Role, Shift};
use common::model::notification::{Notification, NotificationType, Priority};
use common::model::user::User;
use common::requests::CustomNotificationRequest;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

/// Today's reporting state of one foreman.
#[derive(Debug, Clone, Serialize)]
pub struct ForemanStatus {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub shift: Shift,
    pub shift_label: &'static str,
    pub has_activity_today: bool,
    pub analysis_count: i64,
    pub analysis_remaining: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorSummary {
    pub total_foremen: usize,
    pub activity_complete_count: usize,
    pub activity_pending_count: usize,
    pub analysis_pending_count: usize,
}

/// Result of a single manual reminder.
#[derive(Debug)]
pub enum Outcome {
    Sent(User, Notification),
    Refused(String),
}

fn analysis_count(conn: &Connection, foreman_id: i64, day: NaiveDate) -> Result<i64, AppError> {
    analysis::count_in_month(conn, foreman_id, day.year(), day.month())
}

pub fn foremen_status(
    conn: &Connection,
    today: NaiveDate,
) -> Result<(Vec<ForemanStatus>, MonitorSummary), AppError> {
    let foremen = users::list_by_role(conn, Role::Foreman, true)?;
    let mut summary = MonitorSummary {
        total_foremen: foremen.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(foremen.len());
    for foreman in foremen {
        let has_activity_today = activity::exists_for(conn, foreman.id, today)?;
        let count = analysis_count(conn, foreman.id, today)?;
        if has_activity_today {
            summary.activity_complete_count += 1;
        } else {
            summary.activity_pending_count += 1;
        }
        if count < REQUIRED_ANALYSIS_REPORTS {
            summary.analysis_pending_count += 1;
        }
        rows.push(ForemanStatus {
            id: foreman.id,
            name: foreman.display_name(),
            username: foreman.username.clone(),
            shift: foreman.shift,
            shift_label: foreman.shift.label(),
            has_activity_today,
            analysis_count: count,
            analysis_remaining: (REQUIRED_ANALYSIS_REPORTS - count).max(0),
        });
    }
    Ok((rows, summary))
}

/// Manual reminders address the second shift unless the foreman is on the first.
fn reminder_shift(user: &User) -> Shift {
    if user.shift == Shift::First {
        Shift::First
    } else {
        Shift::Second
    }
}

fn active_foreman(conn: &Connection, user_id: i64) -> Result<Option<User>, AppError> {
    Ok(users::find_by_id(conn, user_id)?
        .filter(|u| u.role == Role::Foreman && u.is_active))
}

pub fn manual_activity_reminder(
    conn: &Connection,
    admin: &User,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<Outcome, AppError> {
    let Some(user) = active_foreman(conn, user_id)? else {
        return Ok(Outcome::Refused("User tidak ditemukan".to_owned()));
    };
    if activity::exists_for(conn, user.id, now.date())? {
        return Ok(Outcome::Refused(format!(
            "{} sudah mengisi activity report hari ini",
            user.display_name()
        )));
    }
    let shift = reminder_shift(&user);
    let notification = notifications::insert(
        conn,
        &NewNotification::manual(
            user.id,
            admin.id,
            NotificationType::ActivityReminder,
            format!("📧 Reminder Manual - Activity Report ({})", shift.label()),
            format!(
                "Reminder manual dari admin {}: Harap segera isi activity report hari ini. \
                 Deadline: {}. Silakan login ke sistem untuk mengisi laporan.",
                admin.display_name(),
                deadline_text(shift)
            ),
            Priority::High,
            true,
        ),
        now,
    )?;
    info!("{} sent an activity reminder to {}", admin.username, user.username);
    Ok(Outcome::Sent(user, notification))
}

pub fn manual_analysis_reminder(
    conn: &Connection,
    admin: &User,
    user_id: i64,
    now: NaiveDateTime,
) -> Result<Outcome, AppError> {
    let Some(user) = active_foreman(conn, user_id)? else {
        return Ok(Outcome::Refused("User tidak ditemukan".to_owned()));
    };
    let missing = (REQUIRED_ANALYSIS_REPORTS - analysis_count(conn, user.id, now.date())?).max(0);
    if missing == 0 {
        return Ok(Outcome::Refused(format!(
            "{} sudah lengkap analysis report bulan ini",
            user.display_name()
        )));
    }
    let notification = notifications::insert(
        conn,
        &NewNotification::manual(
            user.id,
            admin.id,
            NotificationType::AnalysisReminder,
            "📊 Reminder Manual - Analysis Report",
            format!(
                "Reminder manual dari admin {}: Anda masih kekurangan {} analysis report bulan ini. \
                 Harap segera dilengkapi. Silakan login ke sistem untuk mengisi laporan.",
                admin.display_name(),
                missing
            ),
            Priority::High,
            true,
        ),
        now,
    )?;
    info!("{} sent an analysis reminder to {}", admin.username, user.username);
    Ok(Outcome::Sent(user, notification))
}

/// Activity reminder to every active foreman without a report today.
pub fn bulk_activity_reminder(conn: &Connection, now: NaiveDateTime) -> Result<Delivered, AppError> {
    let mut delivered = Vec::new();
    for foreman in users::list_by_role(conn, Role::Foreman, true)? {
        if activity::exists_for(conn, foreman.id, now.date())? {
            continue;
        }
        let shift = reminder_shift(&foreman);
        let notification = notifications::insert(
            conn,
            &NewNotification::system(
                foreman.id,
                NotificationType::ActivityReminder,
                format!("📧 Reminder Bulk - Activity Report ({})", shift.label()),
                format!(
                    "Reminder dari admin: Harap segera isi activity report hari ini. Deadline: {}",
                    deadline_text(shift)
                ),
            ),
            now,
        )?;
        delivered.push((foreman, notification));
    }
    Ok(delivered)
}

/// Analysis reminder to every active foreman short of the monthly target.
pub fn bulk_analysis_reminder(conn: &Connection, now: NaiveDateTime) -> Result<Delivered, AppError> {
    let mut delivered = Vec::new();
    for foreman in users::list_by_role(conn, Role::Foreman, true)? {
        let missing = REQUIRED_ANALYSIS_REPORTS - analysis_count(conn, foreman.id, now.date())?;
        if missing <= 0 {
            continue;
        }
        let notification = notifications::insert(
            conn,
            &NewNotification::system(
                foreman.id,
                NotificationType::AnalysisReminder,
                "📊 Reminder Bulk - Analysis Report",
                format!(
                    "Reminder dari admin: Anda masih kekurangan {} analysis report bulan ini. \
                     Harap segera dilengkapi.",
                    missing
                ),
            ),
            now,
        )?;
        delivered.push((foreman, notification));
    }
    Ok(delivered)
}

/// Sends a custom message to the selected active users. Unknown or inactive
/// ids are skipped. `Err(String)` carries the form error shown to the admin.
pub fn send_custom_notification(
    conn: &Connection,
    admin: &User,
    request: &CustomNotificationRequest,
    now: NaiveDateTime,
) -> Result<Result<Delivered, String>, AppError> {
    let title = request.title.trim();
    let message = request.message.trim();
    if title.is_empty() || message.is_empty() {
        return Ok(Err("Title dan message wajib diisi".to_owned()));
    }
    if request.user_ids.is_empty() {
        return Ok(Err("Pilih minimal satu user".to_owned()));
    }

    let mut delivered = Vec::new();
    for user in users::find_many(conn, &request.user_ids)? {
        if !user.is_active {
            continue;
        }
        let notification = notifications::insert(
            conn,
            &NewNotification::manual(
                user.id,
                admin.id,
                NotificationType::ManualMessage,
                format!("📢 {}", title),
                format!("Pesan dari admin {}: {}", admin.display_name(), message),
                request.priority,
                request.requires_acknowledgment,
            ),
            now,
        )?;
        delivered.push((user, notification));
    }
    info!(
        "{} broadcast '{}' to {} users",
        admin.username,
        title,
        delivered.len()
    );
    Ok(Ok(delivered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use crate::store::activity::{NewActivityReport, NewDetail};
    use chrono::NaiveTime;
    use common::model::notification::NotificationStatus;
    use rstest::{fixture, rstest};

    struct Site {
        conn: Connection,
        admin: User,
        first: User,
        second: User,
    }

    #[fixture]
    fn site() -> Site {
        let conn = memory_conn();
        let admin = insert_user(&conn, "admin", Role::Admin);
        let leader = insert_user(&conn, "lead", Role::Leader);
        let first = insert_foreman(&conn, "budi", leader.id, Shift::First);
        let second = insert_foreman(&conn, "eko", leader.id, Shift::Second);
        Site {
            conn,
            admin,
            first,
            second,
        }
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn file_report(conn: &Connection, foreman: &User, now: NaiveDateTime) {
        activity::insert(
            conn,
            &NewActivityReport {
                foreman_id: foreman.id,
                date: now.date(),
                shift: foreman.shift,
                nrp: None,
                section: None,
                details: vec![NewDetail {
                    activity_number: 1,
                    unit_code: "DT-1".into(),
                    hm_km: None,
                    start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                    stop_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    component: None,
                    activities: "Servis".into(),
                    activity_code: None,
                }],
            },
            now,
        )
        .unwrap();
    }

    #[rstest]
    fn manual_activity_reminder_is_urgent_and_acknowledged(site: Site) {
        let outcome = manual_activity_reminder(&site.conn, &site.admin, site.second.id, at(9)).unwrap();
        let Outcome::Sent(user, n) = outcome else {
            panic!("reminder refused");
        };
        assert_eq!(user.id, site.second.id);
        assert_eq!(n.title, "📧 Reminder Manual - Activity Report (Shift 2)");
        assert!(n.message.contains("admin admin name"));
        assert!(n.message.contains("Deadline: 05:00."));
        assert_eq!(n.priority, Priority::High);
        assert!(n.is_manual && n.requires_acknowledgment);
        assert_eq!(n.status, NotificationStatus::Unread);
        assert_eq!(n.created_by_id, Some(site.admin.id));
    }

    #[rstest]
    fn manual_activity_reminder_refused_once_reported(site: Site) {
        file_report(&site.conn, &site.first, at(8));
        let outcome = manual_activity_reminder(&site.conn, &site.admin, site.first.id, at(9)).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Refused(msg) if msg == "budi name sudah mengisi activity report hari ini"
        ));
    }

    #[rstest]
    fn manual_reminder_to_non_foreman_is_refused(site: Site) {
        let outcome = manual_analysis_reminder(&site.conn, &site.admin, site.admin.id, at(9)).unwrap();
        assert!(matches!(outcome, Outcome::Refused(msg) if msg == "User tidak ditemukan"));
    }

    #[rstest]
    fn manual_analysis_reminder_counts_missing_reports(site: Site) {
        let Outcome::Sent(_, n) =
            manual_analysis_reminder(&site.conn, &site.admin, site.first.id, at(9)).unwrap()
        else {
            panic!("reminder refused");
        };
        assert_eq!(n.title, "📊 Reminder Manual - Analysis Report");
        assert!(n.message.contains("kekurangan 3 analysis report"));
    }

    #[rstest]
    fn bulk_activity_reminder_skips_reported_foremen(site: Site) {
        file_report(&site.conn, &site.first, at(8));
        let sent = bulk_activity_reminder(&site.conn, at(10)).unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.id, site.second.id);
        assert_eq!(sent[0].1.title, "📧 Reminder Bulk - Activity Report (Shift 2)");
        assert!(!sent[0].1.is_manual);
    }

    #[rstest]
    fn monitor_counts_pending_work(site: Site) {
        file_report(&site.conn, &site.first, at(8));
        let (rows, summary) = foremen_status(&site.conn, at(8).date()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            summary,
            MonitorSummary {
                total_foremen: 2,
                activity_complete_count: 1,
                activity_pending_count: 1,
                analysis_pending_count: 2,
            }
        );
        assert!(rows.iter().all(|r| r.analysis_remaining == 3));
    }

    #[rstest]
    #[case("", "isi", vec![1], "Title dan message wajib diisi")]
    #[case("Rapat", "  ", vec![1], "Title dan message wajib diisi")]
    #[case("Rapat", "Jam 7", vec![], "Pilih minimal satu user")]
    fn custom_notification_validates_input(
        site: Site,
        #[case] title: &str,
        #[case] message: &str,
        #[case] user_ids: Vec<i64>,
        #[case] error: &str,
    ) {
        let request = CustomNotificationRequest {
            title: title.into(),
            message: message.into(),
            priority: Priority::Low,
            user_ids,
            requires_acknowledgment: false,
        };
        let result = send_custom_notification(&site.conn, &site.admin, &request, at(9)).unwrap();
        assert_eq!(result.unwrap_err(), error);
    }

    #[rstest]
    fn custom_notification_reaches_selected_users(site: Site) {
        let request = CustomNotificationRequest {
            title: "Rapat".into(),
            message: "Jam 7 di workshop".into(),
            priority: Priority::Urgent,
            user_ids: vec![site.first.id, site.second.id, 999],
            requires_acknowledgment: true,
        };
        let sent = send_custom_notification(&site.conn, &site.admin, &request, at(9))
            .unwrap()
            .unwrap();
        assert_eq!(sent.len(), 2);
        let n = &sent[0].1;
        assert_eq!(n.title, "📢 Rapat");
        assert_eq!(n.message, "Pesan dari admin admin name: Jam 7 di workshop");
        assert_eq!(n.notification_type, NotificationType::ManualMessage);
        assert_eq!(n.priority, Priority::Urgent);
    }
}
