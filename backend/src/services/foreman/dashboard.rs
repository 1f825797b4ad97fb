use crate::auth::{require_role, FOREMEN};
use crate::config::REQUIRED_ANALYSIS_REPORTS;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::store::activity::{self, ActivityQuery};
use crate::store::analysis::{self, AnalysisQuery};
use crate::store::notifications;
use crate::web::render_page;
use crate::web::templates::Templates;
use crate::web::views::{ActivityView, AnalysisView, CombinedReport, NotificationView, UserDirectory};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use serde_json::json;

/// Monthly analysis target as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisProgress {
    pub count: i64,
    pub required: i64,
    pub remaining: i64,
    pub complete: bool,
    pub percentage: f64,
    pub status_text: String,
}

impl AnalysisProgress {
    pub fn new(count: i64) -> Self {
        let remaining = (REQUIRED_ANALYSIS_REPORTS - count).max(0);
        let complete = count >= REQUIRED_ANALYSIS_REPORTS;
        let raw = count as f64 / REQUIRED_ANALYSIS_REPORTS as f64 * 100.0;
        Self {
            count,
            required: REQUIRED_ANALYSIS_REPORTS,
            remaining,
            complete,
            percentage: (raw.min(100.0) * 10.0).round() / 10.0,
            status_text: if complete {
                "Selesai bulan ini".to_owned()
            } else {
                format!("{} laporan lagi", remaining)
            },
        }
    }
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub async fn process(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    let today = db::now().date();
    let mut directory = UserDirectory::default();

    let own = ActivityQuery {
        foreman_id: Some(foreman.id),
        ..Default::default()
    };
    let since = |from: NaiveDate| ActivityQuery {
        date_from: Some(from),
        ..own.clone()
    };
    let total_reports = activity::count(&conn, &own)?;
    let today_reports = activity::count(
        &conn,
        &ActivityQuery {
            date: Some(today),
            ..own.clone()
        },
    )?;
    let this_week_reports = activity::count(&conn, &since(today - Duration::days(7)))?;
    let this_month_reports = activity::count(&conn, &since(month_start(today)))?;

    let latest = activity::list(
        &conn,
        &ActivityQuery {
            limit: Some(5),
            ..own.clone()
        },
    )?;
    let activity_views = ActivityView::build_all(&conn, &mut directory, &latest)?;
    let report_today = activity_views.iter().find(|v| v.date == today);

    let progress = AnalysisProgress::new(analysis::count_in_month(
        &conn,
        foreman.id,
        today.year(),
        today.month(),
    )?);
    let mut own_analysis = analysis::list(
        &conn,
        &AnalysisQuery {
            foreman_id: Some(foreman.id),
            ..Default::default()
        },
    )?;
    own_analysis.sort_by(|a, b| b.report_date.cmp(&a.report_date));
    own_analysis.truncate(2);
    let analysis_views = AnalysisView::build_all(&conn, &mut directory, &own_analysis)?;

    let mut recent: Vec<CombinedReport> = activity_views
        .iter()
        .take(3)
        .map(CombinedReport::from_activity)
        .chain(analysis_views.iter().map(CombinedReport::from_analysis))
        .collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(5);

    let latest_notifications: Vec<_> = notifications::list_for_user(&conn, foreman.id, Some(5))?
        .iter()
        .map(NotificationView::new)
        .collect();

    render_page(
        &templates,
        &session,
        &conn,
        Some(&foreman),
        "foreman/dashboard.html",
        json!({
            "activity_reports": activity_views,
            "recent_reports": recent,
            "total_reports": total_reports,
            "today_reports": today_reports,
            "this_week_reports": this_week_reports,
            "this_month_reports": this_month_reports,
            "activity_report_today": report_today,
            "analysis": progress,
            "month_name": today.format("%B %Y").to_string(),
            "notifications": latest_notifications,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 3, 0.0, "3 laporan lagi")]
    #[case(1, 2, 33.3, "2 laporan lagi")]
    #[case(3, 0, 100.0, "Selesai bulan ini")]
    #[case(5, 0, 100.0, "Selesai bulan ini")]
    fn progress_is_capped(
        #[case] count: i64,
        #[case] remaining: i64,
        #[case] percentage: f64,
        #[case] text: &str,
    ) {
        let progress = AnalysisProgress::new(count);
        assert_eq!(progress.remaining, remaining);
        assert_eq!(progress.percentage, percentage);
        assert_eq!(progress.status_text, text);
        assert_eq!(progress.complete, count >= 3);
    }

    #[test]
    fn month_starts_on_the_first() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 17).unwrap();
        assert_eq!(month_start(day), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }
}
