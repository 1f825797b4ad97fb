//! CSV exports of activity reports and user accounts.

use super::Attachment;
use crate::error::AppError;
use common::model::user::User;
use crate::web::views::ActivityView;

pub const REPORT_HEADERS: [&str; 8] = [
    "Date",
    "Foreman",
    "Leader",
    "Unit Code",
    "Component",
    "Activities",
    "Status",
    "Feedback",
];

pub const USER_HEADERS: [&str; 9] = [
    "Name",
    "Username",
    "Email",
    "Role",
    "Department",
    "Leader",
    "NRP",
    "Phone",
    "Shift",
];

fn dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "-",
    }
}

fn finish(writer: csv::Writer<Vec<u8>>, filename: &str) -> Result<Attachment, AppError> {
    let bytes = writer.into_inner().map_err(|e| AppError::Io(e.into_error()))?;
    Ok(Attachment {
        filename: filename.to_owned(),
        content_type: "text/csv",
        bytes,
    })
}

/// One line per detail row, in the order of `reports`. A report without
/// rows still gets one line.
pub fn activity_reports_csv(reports: &[ActivityView]) -> Result<Attachment, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADERS)?;
    for report in reports {
        let date = report.date.to_string();
        let leader = if report.leader_name.is_empty() {
            "-"
        } else {
            report.leader_name.as_str()
        };
        let feedback = dash(report.feedback.as_deref());
        if report.rows.is_empty() {
            writer.write_record([
                date.as_str(),
                report.foreman_name.as_str(),
                leader,
                "-",
                "-",
                "-",
                report.status.as_str(),
                feedback,
            ])?;
            continue;
        }
        for row in &report.rows {
            writer.write_record([
                date.as_str(),
                report.foreman_name.as_str(),
                leader,
                dash(Some(row.detail.unit_code.as_str())),
                dash(row.detail.component.as_deref()),
                row.detail.activities.as_str(),
                report.status.as_str(),
                feedback,
            ])?;
        }
    }
    finish(writer, "activity_reports.csv")
}

/// `users` must already be in export order; `leader_name` resolves the leader column.
pub fn users_csv(
    users: &[User],
    mut leader_name: impl FnMut(&User) -> Option<String>,
) -> Result<Attachment, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(USER_HEADERS)?;
    for user in users {
        let leader = leader_name(user).unwrap_or_else(|| "-".to_owned());
        writer.write_record([
            user.display_name().as_str(),
            user.username.as_str(),
            user.email.as_str(),
            user.role.as_str(),
            user.department.map(|d| d.as_str()).unwrap_or("-"),
            leader.as_str(),
            dash(user.nrp.as_deref()),
            dash(user.phone.as_deref()),
            user.shift.as_i64().to_string().as_str(),
        ])?;
    }
    finish(writer, "users.csv")
}
