use crate::auth::{require_role, ADMINS};
use crate::documents::csv_export::{activity_reports_csv, users_csv};
use crate::documents::Attachment;
use crate::db::Database;
use crate::error::AppError;
use crate::services::{download, filters};
use crate::store::{activity, users};
use crate::web::views::{ActivityView, UserDirectory};
use crate::web::{flash, redirect};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::requests::ReportFilter;
use log::{error, info};
use rusqlite::Connection;
use std::collections::HashMap;

fn respond(session: &Session, result: Result<Attachment, AppError>) -> Result<HttpResponse, AppError> {
    match result {
        Ok(file) => {
            info!("CSV export {} ({} bytes)", file.filename, file.bytes.len());
            Ok(download(file))
        }
        Err(e) => {
            error!("CSV export failed: {}", e);
            flash::error(session, format!("Error generating CSV: {}", e))?;
            Ok(redirect("/superadmin/"))
        }
    }
}

fn reports_file(conn: &Connection, filter: &ReportFilter) -> Result<Attachment, AppError> {
    let rows = activity::list(conn, &filters::activity_query(filter))?;
    let views = ActivityView::build_all(conn, &mut UserDirectory::default(), &rows)?;
    activity_reports_csv(&views)
}

/// Activity reports, one line per detail row. Accepts the report filters.
pub async fn reports(
    db: web::Data<Database>,
    session: Session,
    query: web::Query<ReportFilter>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    respond(&session, reports_file(&conn, &query))
}

fn users_file(conn: &Connection) -> Result<Attachment, AppError> {
    let all = users::list_for_export(conn)?;
    let names: HashMap<i64, String> = all.iter().map(|u| (u.id, u.display_name())).collect();
    users_csv(&all, |user| user.leader_id.and_then(|id| names.get(&id).cloned()))
}

pub async fn users(db: web::Data<Database>, session: Session) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    respond(&session, users_file(&conn))
}
