use crate::auth::{require_role, FOREMEN};
use crate::config::PAGE_SIZE;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::services::filters;
use crate::store::activity::{self, ActivityQuery};
use crate::store::analysis::{self, AnalysisQuery};
use crate::web::render_page;
use crate::web::templates::Templates;
use crate::web::views::{ActivityView, AnalysisView, UserDirectory};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Datelike;
use common::requests::ReportFilter;
use serde::Serialize;
use serde_json::json;

/// Page window over a result set. Out of range pages clamp to the nearest
/// existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(requested: Option<u32>, total: i64, per_page: i64) -> Self {
        let num_pages = ((total + per_page - 1) / per_page).max(1);
        let number = i64::from(requested.unwrap_or(1)).clamp(1, num_pages);
        Self {
            number,
            num_pages,
            total,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }

    pub fn offset(&self, per_page: i64) -> i64 {
        (self.number - 1) * per_page
    }
}

pub async fn reports(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    query: web::Query<ReportFilter>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    let today = db::now().date();

    let filtered = ActivityQuery {
        foreman_id: Some(foreman.id),
        date: filters::day(&query),
        month: filters::month(&query),
        ..Default::default()
    };
    let total = activity::count(&conn, &filtered)?;
    let page = Pagination::new(filters::page(&query), total, PAGE_SIZE);
    let this_month_reports = match filtered.month {
        Some(month) if month != (today.year(), today.month()) => 0,
        _ => activity::count(
            &conn,
            &ActivityQuery {
                month: Some((today.year(), today.month())),
                ..filtered.clone()
            },
        )?,
    };

    let rows = activity::list(
        &conn,
        &ActivityQuery {
            limit: Some(PAGE_SIZE),
            offset: Some(page.offset(PAGE_SIZE)),
            ..filtered
        },
    )?;
    let views = ActivityView::build_all(&conn, &mut UserDirectory::default(), &rows)?;

    render_page(
        &templates,
        &session,
        &conn,
        Some(&foreman),
        "foreman/reports.html",
        json!({
            "reports": views,
            "page": page,
            "total_reports": total,
            "this_month_reports": this_month_reports,
            "date_filter": query.date,
            "month_filter": query.month,
        }),
    )
}

/// Every report of the foreman with its validation state.
pub async fn status(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    let mut directory = UserDirectory::default();

    let activity_rows = activity::list(
        &conn,
        &ActivityQuery {
            foreman_id: Some(foreman.id),
            ..Default::default()
        },
    )?;
    let mut analysis_rows = analysis::list(
        &conn,
        &AnalysisQuery {
            foreman_id: Some(foreman.id),
            ..Default::default()
        },
    )?;
    analysis_rows.sort_by(|a, b| b.report_date.cmp(&a.report_date));

    render_page(
        &templates,
        &session,
        &conn,
        Some(&foreman),
        "foreman/report_status.html",
        json!({
            "activity_reports": ActivityView::build_all(&conn, &mut directory, &activity_rows)?,
            "analysis_reports": AnalysisView::build_all(&conn, &mut directory, &analysis_rows)?,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0, 1, 1)]
    #[case(Some(2), 25, 2, 3)]
    #[case(Some(9), 25, 3, 3)]
    #[case(Some(0), 25, 1, 3)]
    #[case(Some(1), 10, 1, 1)]
    fn pages_clamp(
        #[case] requested: Option<u32>,
        #[case] total: i64,
        #[case] number: i64,
        #[case] num_pages: i64,
    ) {
        let page = Pagination::new(requested, total, 10);
        assert_eq!(page.number, number);
        assert_eq!(page.num_pages, num_pages);
        assert_eq!(page.has_next, number < num_pages);
    }

    #[test]
    fn offset_skips_earlier_pages() {
        assert_eq!(Pagination::new(Some(3), 40, 10).offset(10), 20);
    }
}
