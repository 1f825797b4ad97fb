//! # Reminders
//!
//! Creation of the automatic activity and analysis reminders, and the sweeps
//! run by the notification scheduler.
//!
//! Reminders are deduplicated in the database: an activity reminder is not
//! created twice with the same title for the same user on the same day, and
//! an analysis reminder at most once per user per month. Every function
//! returns the notifications it actually created, paired with the recipient,
//! so that callers can forward them to Telegram.

use crate::config::{shift_deadline, REQUIRED_ANALYSIS_REPORTS};
use crate::error::AppError;
use crate::store::notifications::{self, NewNotification};
use crate::store::{activity, analysis, users};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use common::model::choices::{Role, Shift};
use common::model::notification::{Notification, NotificationType};
use common::model::user::User;
use log::info;
use rusqlite::Connection;

/// Days before month end at which the analysis reminder goes out.
pub const ANALYSIS_REMINDER_DAYS_LEFT: i64 = 3;

pub type Delivered = Vec<(User, Notification)>;

/// How long before the shift deadline an activity reminder is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWindow {
    OneHour,
    HalfHour,
    TenMinutes,
}

impl ReminderWindow {
    /// Window matching `hours_left`, with a few minutes of tolerance so a
    /// five-minute sweep hits each window once.
    pub fn from_hours_left(hours_left: f64) -> Option<Self> {
        if (0.9..=1.1).contains(&hours_left) {
            Some(ReminderWindow::OneHour)
        } else if (0.4..=0.6).contains(&hours_left) {
            Some(ReminderWindow::HalfHour)
        } else if (0.1..=0.2).contains(&hours_left) {
            Some(ReminderWindow::TenMinutes)
        } else {
            None
        }
    }

    pub fn title(&self, shift: Shift) -> String {
        let shift_text = shift.label();
        match self {
            ReminderWindow::OneHour => {
                format!("⏰ Deadline Activity Report - 1 Jam Lagi! ({})", shift_text)
            }
            ReminderWindow::HalfHour => {
                format!("🚨 Deadline Activity Report - 30 Menit Lagi! ({})", shift_text)
            }
            ReminderWindow::TenMinutes => format!(
                "🔥 URGENT! Deadline Activity Report - 10 Menit Lagi! ({})",
                shift_text
            ),
        }
    }

    pub fn message(&self, deadline: &str) -> String {
        match self {
            ReminderWindow::OneHour => format!(
                "Jangan lupa isi activity report hari ini. Deadline dalam 1 jam lagi ({}).",
                deadline
            ),
            ReminderWindow::HalfHour => format!(
                "Segera isi activity report hari ini! Deadline dalam 30 menit lagi ({}).",
                deadline
            ),
            ReminderWindow::TenMinutes => format!(
                "URGENT! Activity report harus diisi sekarang! Deadline dalam 10 menit lagi ({}).",
                deadline
            ),
        }
    }
}

/// `HH:MM` deadline text of a shift.
pub fn deadline_text(shift: Shift) -> String {
    shift_deadline(shift)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_owned())
}

/// Creates the activity reminder for `window` unless the same one exists today.
pub fn create_activity_reminder(
    conn: &Connection,
    user: &User,
    window: ReminderWindow,
    now: NaiveDateTime,
) -> Result<Option<Notification>, AppError> {
    let kind = NotificationType::ActivityReminder;
    let title = window.title(user.shift);
    if notifications::exists_same_day(conn, user.id, kind, &title, now.date())? {
        return Ok(None);
    }
    let message = window.message(&deadline_text(user.shift));
    let created = notifications::insert(
        conn,
        &NewNotification::system(user.id, kind, title, message),
        now,
    )?;
    Ok(Some(created))
}

/// Creates the monthly analysis reminder. Only the three-days-left reminder
/// exists; any other `days_left` creates nothing.
pub fn create_analysis_reminder(
    conn: &Connection,
    user: &User,
    days_left: i64,
    missing_count: i64,
    now: NaiveDateTime,
) -> Result<Option<Notification>, AppError> {
    if days_left != ANALYSIS_REMINDER_DAYS_LEFT {
        return Ok(None);
    }
    let kind = NotificationType::AnalysisReminder;
    if notifications::exists_in_month(conn, user.id, kind, now.year(), now.month())? {
        return Ok(None);
    }
    let title = format!("📊 Analysis Report Reminder - {} Laporan Kurang", missing_count);
    let message = format!(
        "Anda masih kekurangan {} analysis report bulan ini. Deadline dalam 3 hari lagi.",
        missing_count
    );
    let created = notifications::insert(
        conn,
        &NewNotification::system(user.id, kind, title, message),
        now,
    )?;
    Ok(Some(created))
}

/// Clears the auto-removable reminders of `kind` once the task is done.
pub fn remove_completed_notifications(
    conn: &Connection,
    user_id: i64,
    kind: NotificationType,
) -> Result<usize, AppError> {
    notifications::remove_completed(conn, user_id, kind)
}

/// Active foremen on `shift` without an activity report dated `day`.
pub fn foremen_missing_report(
    conn: &Connection,
    shift: Shift,
    day: NaiveDate,
) -> Result<Vec<User>, AppError> {
    let mut missing = Vec::new();
    for foreman in users::active_foremen_on_shift(conn, shift)? {
        if !activity::exists_for(conn, foreman.id, day)? {
            missing.push(foreman);
        }
    }
    Ok(missing)
}

/// Sweep run every few minutes: sends the window reminder of every shift
/// whose deadline is still ahead today.
pub fn check_activity_reminders(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Delivered, AppError> {
    let today = now.date();
    let mut delivered = Vec::new();
    for shift in [Shift::First, Shift::Second] {
        let Some(deadline) = shift_deadline(shift) else {
            continue;
        };
        let deadline = today.and_time(deadline);
        if now > deadline {
            continue;
        }
        let hours_left = (deadline - now).num_seconds() as f64 / 3600.0;
        let Some(window) = ReminderWindow::from_hours_left(hours_left) else {
            continue;
        };
        for foreman in foremen_missing_report(conn, shift, today)? {
            if let Some(n) = create_activity_reminder(conn, &foreman, window, now)? {
                info!("Sent {:?} reminder to {}", window, foreman.username);
                delivered.push((foreman, n));
            }
        }
    }
    Ok(delivered)
}

/// One-hour reminder for every foreman of `shift` still missing today's report.
pub fn send_pre_deadline_reminders(
    conn: &Connection,
    shift: Shift,
    now: NaiveDateTime,
) -> Result<Delivered, AppError> {
    let mut delivered = Vec::new();
    for foreman in foremen_missing_report(conn, shift, now.date())? {
        if let Some(n) = create_activity_reminder(conn, &foreman, ReminderWindow::OneHour, now)? {
            delivered.push((foreman, n));
        }
    }
    info!(
        "Pre-deadline reminders for {}: {} sent",
        shift.label(),
        delivered.len()
    );
    Ok(delivered)
}

/// Days from `day` to the last day of its month.
pub fn days_until_month_end(day: NaiveDate) -> i64 {
    let (next_year, next_month) = if day.month() == 12 {
        (day.year() + 1, 1)
    } else {
        (day.year(), day.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| (last - day).num_days())
        .unwrap_or(0)
}

/// Reminds foremen short of monthly analysis reports three days before month end.
pub fn check_analysis_reminders(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<Delivered, AppError> {
    let today = now.date();
    let days_left = days_until_month_end(today);
    if days_left != ANALYSIS_REMINDER_DAYS_LEFT {
        return Ok(Vec::new());
    }
    let mut delivered = Vec::new();
    for foreman in users::list_by_role(conn, Role::Foreman, true)? {
        let count = analysis::count_in_month(conn, foreman.id, today.year(), today.month())?;
        let missing = REQUIRED_ANALYSIS_REPORTS - count;
        if missing <= 0 {
            continue;
        }
        if let Some(n) = create_analysis_reminder(conn, &foreman, days_left, missing, now)? {
            delivered.push((foreman, n));
        }
    }
    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use crate::store::activity::{NewActivityReport, NewDetail};
    use chrono::NaiveTime;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn submit_report(conn: &Connection, foreman_id: i64, date: NaiveDate) {
        activity::insert(
            conn,
            &NewActivityReport {
                foreman_id,
                date,
                shift: Shift::First,
                nrp: None,
                section: None,
                details: vec![NewDetail {
                    activity_number: 1,
                    unit_code: "DT01".into(),
                    hm_km: None,
                    start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                    stop_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                    component: None,
                    activities: "Cek".into(),
                    activity_code: None,
                }],
            },
            at(2025, 1, 1, 0, 0),
        )
        .unwrap();
    }

    #[rstest]
    #[case(1.0, Some(ReminderWindow::OneHour))]
    #[case(0.95, Some(ReminderWindow::OneHour))]
    #[case(0.5, Some(ReminderWindow::HalfHour))]
    #[case(0.15, Some(ReminderWindow::TenMinutes))]
    #[case(0.75, None)]
    #[case(2.0, None)]
    fn windows_have_tolerance(#[case] hours: f64, #[case] expected: Option<ReminderWindow>) {
        assert_eq!(ReminderWindow::from_hours_left(hours), expected);
    }

    #[test]
    fn activity_reminder_is_not_duplicated_same_day() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        let now = at(2025, 3, 10, 17, 0);

        let first = create_activity_reminder(&conn, &foreman, ReminderWindow::OneHour, now).unwrap();
        let again = create_activity_reminder(&conn, &foreman, ReminderWindow::OneHour, now).unwrap();
        let other_window =
            create_activity_reminder(&conn, &foreman, ReminderWindow::HalfHour, now).unwrap();
        let next_day =
            create_activity_reminder(&conn, &foreman, ReminderWindow::OneHour, at(2025, 3, 11, 17, 0))
                .unwrap();

        let first = first.unwrap();
        assert!(first.title.contains("1 Jam Lagi"));
        assert!(first.title.contains("Shift 1"));
        assert!(first.message.contains("18:00"));
        assert!(again.is_none());
        assert!(other_window.is_some());
        assert!(next_day.is_some());
    }

    #[test]
    fn sweep_skips_foremen_with_report_and_other_shift() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let missing = insert_foreman(&conn, "missing", leader.id, Shift::First);
        let done = insert_foreman(&conn, "done", leader.id, Shift::First);
        insert_foreman(&conn, "night", leader.id, Shift::Second);
        insert_foreman(&conn, "off", leader.id, Shift::Off);
        let now = at(2025, 3, 10, 17, 0);
        submit_report(&conn, done.id, now.date());

        let delivered = check_activity_reminders(&conn, now).unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0.id, missing.id);

        let repeated = check_activity_reminders(&conn, at(2025, 3, 10, 17, 5)).unwrap();
        assert!(repeated.is_empty());
    }

    #[test]
    fn night_shift_window_before_five() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        insert_foreman(&conn, "night", leader.id, Shift::Second);
        let delivered = check_activity_reminders(&conn, at(2025, 3, 10, 4, 50)).unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].1.title.contains("10 Menit"));
        assert!(delivered[0].1.message.contains("05:00"));
    }

    #[test]
    fn pre_deadline_reminder_shares_dedupe_with_sweep() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        insert_foreman(&conn, "mek", leader.id, Shift::First);
        let now = at(2025, 3, 10, 17, 0);
        assert_eq!(send_pre_deadline_reminders(&conn, Shift::First, now).unwrap().len(), 1);
        assert!(check_activity_reminders(&conn, now).unwrap().is_empty());
    }

    #[rstest]
    #[case(NaiveDate::from_ymd_opt(2025, 1, 28).unwrap(), 3)]
    #[case(NaiveDate::from_ymd_opt(2025, 2, 25).unwrap(), 3)]
    #[case(NaiveDate::from_ymd_opt(2024, 2, 26).unwrap(), 3)]
    #[case(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(), 0)]
    fn month_end_distance(#[case] day: NaiveDate, #[case] expected: i64) {
        assert_eq!(days_until_month_end(day), expected);
    }

    #[test]
    fn analysis_reminder_once_per_month_and_only_when_short() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let short = insert_foreman(&conn, "short", leader.id, Shift::First);
        let now = at(2025, 1, 28, 9, 0);

        let delivered = check_analysis_reminders(&conn, now).unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0.id, short.id);
        assert!(delivered[0].1.title.contains("3 Laporan Kurang"));

        assert!(check_analysis_reminders(&conn, now).unwrap().is_empty());
        assert!(check_analysis_reminders(&conn, at(2025, 1, 27, 9, 0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn completed_reminders_are_removed() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        create_activity_reminder(&conn, &foreman, ReminderWindow::OneHour, at(2025, 3, 10, 17, 0))
            .unwrap();
        let removed =
            remove_completed_notifications(&conn, foreman.id, NotificationType::ActivityReminder)
                .unwrap();
        assert_eq!(removed, 1);
    }
}
