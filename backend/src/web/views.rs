//! Serializable shapes handed to the templates: the stored rows plus the
//! labels and derived values the pages print.

use crate::store::users;
use crate::error::AppError;
use chrono::{NaiveDate, NaiveDateTime};
use common::model::activity::{ActivityReport, ActivityReportDetail};
use common::model::analysis::AnalysisReport;
use common::model::choices::{label_of, ReportStatus, COMPONENTS};
use common::model::notification::Notification;
use common::model::quota::LeaderQuota;
use common::model::user::User;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub display_name: String,
    pub role_label: &'static str,
    pub department_label: Option<&'static str>,
    pub shift_label: &'static str,
    pub leader_name: Option<String>,
}

impl UserView {
    pub fn new(user: &User, leader: Option<&User>) -> Self {
        Self {
            display_name: user.display_name(),
            role_label: user.role.label(),
            department_label: user.department.map(|d| d.label()),
            shift_label: user.shift.label(),
            leader_name: leader.map(User::display_name),
            user: user.clone(),
        }
    }
}

/// Looks up users by id once per page instead of once per row.
#[derive(Default)]
pub struct UserDirectory {
    cache: HashMap<i64, Option<User>>,
}

impl UserDirectory {
    pub fn get(&mut self, conn: &Connection, id: i64) -> Result<Option<User>, AppError> {
        if let Some(hit) = self.cache.get(&id) {
            return Ok(hit.clone());
        }
        let user = users::find_by_id(conn, id)?;
        self.cache.insert(id, user.clone());
        Ok(user)
    }

    pub fn name(&mut self, conn: &Connection, id: Option<i64>) -> Result<String, AppError> {
        match id {
            Some(id) => Ok(self
                .get(conn, id)?
                .map(|u| u.display_name())
                .unwrap_or_else(|| "-".to_owned())),
            None => Ok("-".to_owned()),
        }
    }

    pub fn user_view(&mut self, conn: &Connection, user: &User) -> Result<UserView, AppError> {
        let leader = match user.leader_id {
            Some(id) => self.get(conn, id)?,
            None => None,
        };
        Ok(UserView::new(user, leader.as_ref()))
    }
}

#[derive(Debug, Serialize)]
pub struct DetailView {
    #[serde(flatten)]
    pub detail: ActivityReportDetail,
    pub duration: f64,
    pub component_label: Option<&'static str>,
    pub activity_code_label: Option<&'static str>,
}

impl From<&ActivityReportDetail> for DetailView {
    fn from(detail: &ActivityReportDetail) -> Self {
        Self {
            duration: (detail.duration_hours() * 10.0).round() / 10.0,
            component_label: detail.component_label(),
            activity_code_label: detail.activity_code.map(|c| c.as_str()),
            detail: detail.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityView {
    pub id: i64,
    pub foreman_id: i64,
    pub date: NaiveDate,
    pub shift_label: &'static str,
    pub nrp: Option<String>,
    pub section: Option<String>,
    pub status: ReportStatus,
    pub status_label: &'static str,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
    pub foreman_name: String,
    pub leader_name: String,
    pub rows: Vec<DetailView>,
    pub total_hours: f64,
}

impl ActivityView {
    pub fn build(
        conn: &Connection,
        directory: &mut UserDirectory,
        report: &ActivityReport,
    ) -> Result<Self, AppError> {
        let foreman = directory.get(conn, report.foreman_id)?;
        let leader_id = foreman.as_ref().and_then(|f| f.leader_id);
        Ok(Self {
            id: report.id,
            foreman_id: report.foreman_id,
            date: report.date,
            shift_label: report.shift.label(),
            nrp: report.nrp.clone(),
            section: report.section.clone(),
            status: report.status,
            status_label: report.status.label(),
            feedback: report.feedback.clone(),
            created_at: report.created_at,
            foreman_name: foreman
                .map(|f| f.display_name())
                .unwrap_or_else(|| "-".to_owned()),
            leader_name: directory.name(conn, leader_id)?,
            rows: report.details.iter().map(DetailView::from).collect(),
            total_hours: (report.total_hours() * 10.0).round() / 10.0,
        })
    }

    pub fn build_all(
        conn: &Connection,
        directory: &mut UserDirectory,
        reports: &[ActivityReport],
    ) -> Result<Vec<Self>, AppError> {
        reports
            .iter()
            .map(|r| Self::build(conn, directory, r))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisView {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub status_label: &'static str,
    pub problem_label: Option<&'static str>,
    pub factors: Vec<&'static str>,
    pub foreman_name: String,
    pub leader_name: String,
}

impl AnalysisView {
    pub fn build(
        conn: &Connection,
        directory: &mut UserDirectory,
        report: &AnalysisReport,
    ) -> Result<Self, AppError> {
        let foreman = directory.get(conn, report.foreman_id)?;
        let leader_id = foreman.as_ref().and_then(|f| f.leader_id);
        Ok(Self {
            status_label: report.status.label(),
            problem_label: report.problem_label(),
            factors: report.factors_4m1e(),
            foreman_name: foreman
                .map(|f| f.display_name())
                .unwrap_or_else(|| "-".to_owned()),
            leader_name: directory.name(conn, leader_id)?,
            report: report.clone(),
        })
    }

    pub fn build_all(
        conn: &Connection,
        directory: &mut UserDirectory,
        reports: &[AnalysisReport],
    ) -> Result<Vec<Self>, AppError> {
        reports
            .iter()
            .map(|r| Self::build(conn, directory, r))
            .collect()
    }
}

/// Row of the mixed activity/analysis lists on the dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedReport {
    pub kind: &'static str,
    pub id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub status: ReportStatus,
    pub status_label: &'static str,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
    pub foreman_name: String,
}

impl CombinedReport {
    pub fn from_activity(view: &ActivityView) -> Self {
        let title = view
            .rows
            .first()
            .map(|row| {
                let component = row
                    .detail
                    .component
                    .as_deref()
                    .and_then(|c| label_of(COMPONENTS, c))
                    .unwrap_or("-");
                format!("{} - {}", row.detail.unit_code, component)
            })
            .unwrap_or_else(|| "Activity Report".to_owned());
        Self {
            kind: "activity",
            id: view.id,
            date: view.date,
            title,
            status: view.status,
            status_label: view.status_label,
            feedback: view.feedback.clone(),
            created_at: view.created_at,
            foreman_name: view.foreman_name.clone(),
        }
    }

    pub fn from_analysis(view: &AnalysisView) -> Self {
        Self {
            kind: "analysis",
            id: view.report.id,
            date: view.report.report_date,
            title: view.report.short_title(50),
            status: view.report.status,
            status_label: view.status_label,
            feedback: view.report.feedback.clone(),
            created_at: view.report.created_at,
            foreman_name: view.foreman_name.clone(),
        }
    }
}

/// Newest first by creation time.
pub fn sort_newest_first(items: &mut [CombinedReport]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[derive(Debug, Serialize)]
pub struct QuotaView {
    #[serde(flatten)]
    pub quota: LeaderQuota,
    pub available_slots: i64,
    pub can_add_foreman: bool,
}

impl From<&LeaderQuota> for QuotaView {
    fn from(quota: &LeaderQuota) -> Self {
        Self {
            available_slots: quota.available_slots(),
            can_add_foreman: quota.can_add_foreman(),
            quota: quota.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub type_label: &'static str,
    pub is_unread: bool,
    pub recipient_name: Option<String>,
    pub sender_name: Option<String>,
}

impl NotificationView {
    pub fn new(notification: &Notification) -> Self {
        Self {
            type_label: notification.notification_type.label(),
            is_unread: notification.is_unread(),
            recipient_name: None,
            sender_name: None,
            notification: notification.clone(),
        }
    }

    pub fn with_names(
        conn: &Connection,
        directory: &mut UserDirectory,
        notification: &Notification,
    ) -> Result<Self, AppError> {
        let mut view = Self::new(notification);
        view.recipient_name = Some(directory.name(conn, Some(notification.recipient_id))?);
        view.sender_name = match notification.created_by_id {
            Some(id) => Some(directory.name(conn, Some(id))?),
            None => None,
        };
        Ok(view)
    }
}
