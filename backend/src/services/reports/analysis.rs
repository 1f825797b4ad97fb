//! Two-step entry of technical analysis reports and their documentation
//! images.

use super::can_view;
use crate::auth::{dashboard_path, require_role, require_user, FOREMEN};
use crate::config::{MAX_IMAGE_BYTES, MAX_TEXT_FIELD_BYTES};
use crate::db::{self, Database};
use crate::error::AppError;
use crate::forms::analysis::{complete_analysis_report, create_analysis_report};
use crate::services::{flash_errors, split_validation};
use crate::store::analysis;
use crate::web::form::FormData;
use crate::web::templates::Templates;
use crate::web::upload::read_multipart;
use crate::web::views::{AnalysisView, UserDirectory};
use crate::web::{flash, redirect, render_page};
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use common::model::analysis::{AnalysisReport, DocumentationSlot};
use common::model::choices::{PROBLEMS, SECTION_TRACKS};
use common::model::user::User;
use rusqlite::Connection;
use serde_json::{json, Value};

const NO_ACCESS: &str = "Laporan tidak ditemukan atau Anda tidak memiliki akses.";

fn step2_path(id: i64) -> String {
    format!("/foreman/create-analysis-report/step2/{}/", id)
}

fn render_step1(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    foreman: &User,
    values: Value,
) -> Result<HttpResponse, AppError> {
    let problems: Vec<_> = PROBLEMS
        .iter()
        .map(|(code, label)| json!({"value": code, "label": label}))
        .collect();
    render_page(
        templates,
        session,
        conn,
        Some(foreman),
        "reports/analysis_form.html",
        json!({
            "section_tracks": SECTION_TRACKS,
            "problems": problems,
            "default_email": foreman.email,
            "today": db::now().date(),
            "values": values,
        }),
    )
}

pub async fn create_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    render_step1(&templates, &session, &conn, &foreman, json!({}))
}

pub async fn create(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    let data = FormData::from(form.into_inner());

    match split_validation(create_analysis_report(&conn, &foreman, &data, db::now()))? {
        Ok(id) => {
            flash::success(
                &session,
                "Informasi dasar berhasil disimpan! Silakan lengkapi analisis lanjutan.",
            )?;
            Ok(redirect(step2_path(id)))
        }
        Err(messages) => {
            flash::error(&session, "Terjadi kesalahan dalam pembuatan Analysis Report.")?;
            flash_errors(&session, &messages)?;
            render_step1(&templates, &session, &conn, &foreman, Value::Object(data.values()))
        }
    }
}

/// The report if it belongs to `foreman`.
fn own_report(
    conn: &Connection,
    foreman: &User,
    id: i64,
) -> Result<Option<AnalysisReport>, AppError> {
    Ok(analysis::find_by_id(conn, id)?.filter(|r| r.foreman_id == foreman.id))
}

fn render_step2(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    foreman: &User,
    report: &AnalysisReport,
) -> Result<HttpResponse, AppError> {
    let view = AnalysisView::build(conn, &mut UserDirectory::default(), report)?;
    render_page(
        templates,
        session,
        conn,
        Some(foreman),
        "reports/analysis_step2.html",
        json!({"report": view, "max_image_mb": MAX_IMAGE_BYTES / (1024 * 1024)}),
    )
}

pub async fn step2_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    match own_report(&conn, &foreman, path.into_inner())? {
        Some(report) => render_step2(&templates, &session, &conn, &foreman, &report),
        None => {
            flash::error(&session, NO_ACCESS)?;
            Ok(redirect(dashboard_path(foreman.role)))
        }
    }
}

pub async fn step2(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    {
        let conn = db.conn()?;
        require_role(&session, &conn, FOREMEN)?;
    }
    let body = split_validation(
        read_multipart(payload, MAX_IMAGE_BYTES, MAX_TEXT_FIELD_BYTES).await,
    )?;

    let conn = db.conn()?;
    let foreman = require_role(&session, &conn, FOREMEN)?;
    let Some(report) = own_report(&conn, &foreman, path.into_inner())? else {
        flash::error(&session, NO_ACCESS)?;
        return Ok(redirect(dashboard_path(foreman.role)));
    };

    let saved = match body {
        Ok((data, uploads)) => split_validation(complete_analysis_report(
            &conn,
            &foreman,
            report.id,
            &data,
            &uploads,
            db::now(),
        ))?,
        Err(messages) => Err(messages),
    };
    match saved {
        Ok(()) => {
            flash::success(&session, "Analysis Report berhasil dilengkapi!")?;
            Ok(redirect(dashboard_path(foreman.role)))
        }
        Err(messages) => {
            flash::error(&session, "Ada kesalahan dalam form. Silakan periksa kembali.")?;
            flash_errors(&session, &messages)?;
            render_step2(&templates, &session, &conn, &foreman, &report)
        }
    }
}

/// Serves a stored documentation image.
pub async fn image(
    db: web::Data<Database>,
    session: Session,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, AppError> {
    let (id, slot) = path.into_inner();
    let slot = DocumentationSlot::parse(&slot).ok_or_else(|| AppError::not_found("Gambar"))?;
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let report = analysis::get(&conn, id)?;
    if !can_view(&conn, &user, report.foreman_id)? {
        return Err(AppError::not_found("Gambar"));
    }
    let stored = analysis::load_image(&conn, id, slot)?.ok_or_else(|| AppError::not_found("Gambar"))?;
    Ok(HttpResponse::Ok()
        .content_type(stored.mime)
        .insert_header((header::CACHE_CONTROL, "private, max-age=3600"))
        .body(stored.bytes))
}
