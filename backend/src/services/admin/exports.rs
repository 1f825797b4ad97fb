//! PDF exports of activity and analysis reports.
//!
//! A failed render never surfaces as a server error: the admin is sent back
//! to the dashboard with the reason flashed.

use crate::auth::{require_role, ADMINS};
use crate::config::AppConfig;
use crate::db::{self, Database};
use crate::documents::activity_form::render_activity_reports;
use crate::documents::bundle::{export_analysis_reports, load_documentation};
use crate::documents::tar::render_tar;
use crate::documents::{Attachment, PdfSettings};
use crate::error::AppError;
use crate::services::{download, filters};
use crate::store::{activity, analysis, users};
use crate::web::templates::Templates;
use crate::web::views::{ActivityView, AnalysisView, UserDirectory};
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::choices::Role;
use common::requests::ReportFilter;
use log::error;
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;

const BACK: &str = "/superadmin/";

fn render_failed(session: &Session, e: AppError) -> Result<HttpResponse, AppError> {
    error!("PDF export failed: {}", e);
    flash::error(session, format!("Error generating PDF: {}", e))?;
    Ok(redirect(BACK))
}

pub async fn page(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let mut directory = UserDirectory::default();
    let foremen = users::list_by_role(&conn, Role::Foreman, false)?
        .iter()
        .map(|u| directory.user_view(&conn, u))
        .collect::<Result<Vec<_>, _>>()?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/pdf_export.html",
        json!({"foremen": foremen}),
    )
}

fn activity_export(
    conn: &Connection,
    settings: &PdfSettings,
    filter: &ReportFilter,
) -> Result<Attachment, AppError> {
    let mut directory = UserDirectory::default();
    let reports = activity::list(conn, &filters::activity_query(filter))?;
    let views = ActivityView::build_all(conn, &mut directory, &reports)?;

    let mut departments = HashMap::new();
    for view in &views {
        if let Some(foreman) = directory.get(conn, view.foreman_id)? {
            if let Some(department) = foreman.department {
                departments.insert(view.foreman_id, department.label().to_owned());
            }
        }
    }
    render_activity_reports(
        settings,
        &views,
        |view| departments.get(&view.foreman_id).cloned(),
        db::now().date(),
    )
}

pub async fn activity_pdf(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<ReportFilter>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    let settings = PdfSettings::from(config.get_ref());
    match activity_export(&conn, &settings, &query) {
        Ok(file) => Ok(download(file)),
        Err(e) => render_failed(&session, e),
    }
}

fn analysis_export(
    conn: &Connection,
    settings: &PdfSettings,
    filter: &ReportFilter,
) -> Result<Option<Attachment>, AppError> {
    let mut reports = analysis::list(conn, &filters::analysis_query(filter))?;
    reports.sort_by(|a, b| b.report_date.cmp(&a.report_date));
    let views = AnalysisView::build_all(conn, &mut UserDirectory::default(), &reports)?;
    export_analysis_reports(conn, settings, &views, db::now().date())
}

pub async fn analysis_pdf(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    session: Session,
    query: web::Query<ReportFilter>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    let settings = PdfSettings::from(config.get_ref());
    match analysis_export(&conn, &settings, &query) {
        Ok(Some(file)) => Ok(download(file)),
        Ok(None) => {
            flash::warning(
                &session,
                "Tidak ada laporan analisis yang ditemukan dengan filter yang dipilih.",
            )?;
            Ok(redirect(BACK))
        }
        Err(e) => render_failed(&session, e),
    }
}

/// Single TAR form. Leaders may export reports of their own foremen.
pub async fn single_analysis_pdf(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_role(&session, &conn, &[Role::Admin, Role::Superadmin, Role::Leader])?;
    let report = analysis::get(&conn, path.into_inner())?;
    if user.role == Role::Leader {
        let owner = users::find_by_id(&conn, report.foreman_id)?;
        if owner.and_then(|f| f.leader_id) != Some(user.id) {
            return Err(AppError::not_found("Laporan analisis"));
        }
    }

    let settings = PdfSettings::from(config.get_ref());
    let rendered = AnalysisView::build(&conn, &mut UserDirectory::default(), &report)
        .and_then(|view| {
            let documentation = load_documentation(&conn, report.id)?;
            render_tar(&settings, &view, &documentation)
        });
    match rendered {
        Ok(file) => Ok(download(file)),
        Err(e) => render_failed(&session, e),
    }
}
