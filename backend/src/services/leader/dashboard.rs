use crate::auth::{require_role, LEADERS};
use crate::db::{self, Database};
use crate::error::AppError;
use crate::store::activity::{self, ActivityQuery};
use crate::store::analysis::{self, AnalysisQuery};
use crate::store::users;
use crate::web::render_page;
use crate::web::templates::Templates;
use crate::web::views::{sort_newest_first, ActivityView, AnalysisView, CombinedReport, UserDirectory};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use common::model::choices::ReportStatus;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct LeaderStats {
    pub total_employees: usize,
    pub today_reports: usize,
    pub pending_validation: usize,
    pub completed_reports: usize,
}

/// Splits the combined list into pending, today's and validated reports.
pub fn partition(
    reports: &[CombinedReport],
    today: NaiveDate,
) -> (Vec<CombinedReport>, Vec<CombinedReport>, Vec<CombinedReport>) {
    let pick = |keep: &dyn Fn(&CombinedReport) -> bool| -> Vec<CombinedReport> {
        reports.iter().filter(|r| keep(r)).cloned().collect()
    };
    (
        pick(&|r| r.status == ReportStatus::Pending),
        pick(&|r| r.date == today),
        pick(&|r| r.status.is_validated()),
    )
}

pub async fn process(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let leader = require_role(&session, &conn, LEADERS)?;
    let today = db::now().date();
    let mut directory = UserDirectory::default();

    let foremen = users::foremen_of(&conn, leader.id)?
        .iter()
        .map(|u| directory.user_view(&conn, u))
        .collect::<Result<Vec<_>, _>>()?;

    let activity_rows = activity::list(
        &conn,
        &ActivityQuery {
            leader_id: Some(leader.id),
            ..Default::default()
        },
    )?;
    let analysis_rows = analysis::list(
        &conn,
        &AnalysisQuery {
            leader_id: Some(leader.id),
            ..Default::default()
        },
    )?;
    let mut combined: Vec<CombinedReport> = ActivityView::build_all(&conn, &mut directory, &activity_rows)?
        .iter()
        .map(CombinedReport::from_activity)
        .chain(
            AnalysisView::build_all(&conn, &mut directory, &analysis_rows)?
                .iter()
                .map(CombinedReport::from_analysis),
        )
        .collect();
    sort_newest_first(&mut combined);

    let (pending, today_reports, validated) = partition(&combined, today);
    let stats = LeaderStats {
        total_employees: foremen.len(),
        today_reports: today_reports.len(),
        pending_validation: pending.len(),
        completed_reports: validated.len(),
    };
    let recent: Vec<_> = combined.iter().take(5).collect();

    render_page(
        &templates,
        &session,
        &conn,
        Some(&leader),
        "leader/dashboard.html",
        json!({
            "stats": stats,
            "recent_reports": recent,
            "my_foremen": foremen,
            "pending_reports": pending,
            "today_reports": today_reports,
            "validated_reports": validated,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn report(id: i64, date: NaiveDate, status: ReportStatus) -> CombinedReport {
        CombinedReport {
            kind: "activity",
            id,
            date,
            title: format!("R{}", id),
            status,
            status_label: status.label(),
            feedback: None,
            created_at: NaiveDateTime::default(),
            foreman_name: "mek".into(),
        }
    }

    #[test]
    fn reports_fall_into_every_matching_tab() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let reports = vec![
            report(1, today, ReportStatus::Pending),
            report(2, yesterday, ReportStatus::Approved),
            report(3, today, ReportStatus::Rejected),
        ];
        let (pending, today_list, validated) = partition(&reports, today);
        let ids = |list: &[CombinedReport]| list.iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(&pending), vec![1]);
        assert_eq!(ids(&today_list), vec![1, 3]);
        assert_eq!(ids(&validated), vec![2, 3]);
    }
}
