use super::can_view;
use crate::auth::{dashboard_path, require_role, require_user, FOREMEN};
use crate::db::{self, Database};
use crate::error::AppError;
use crate::forms::activity::{submit_activity_report, ActivityForm};
use crate::services::{flash_errors, split_validation};
use crate::store::activity;
use crate::web::form::FormData;
use crate::web::templates::Templates;
use crate::web::views::{ActivityView, UserDirectory};
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::activity::MAX_DETAILS;
use common::model::choices::{ActivityCode, Shift, COMPONENTS};
use common::model::user::User;
use rusqlite::Connection;
use serde_json::{json, Value};

fn render_form(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    foreman: &User,
    values: Value,
) -> Result<HttpResponse, AppError> {
    let components: Vec<_> = COMPONENTS
        .iter()
        .map(|(code, label)| json!({"value": code, "label": label}))
        .collect();
    let codes: Vec<_> = ActivityCode::ALL.iter().map(|c| c.as_str()).collect();
    let shifts: Vec<_> = [Shift::First, Shift::Second]
        .iter()
        .map(|s| json!({"value": s.as_i64(), "label": s.label()}))
        .collect();
    render_page(
        templates,
        session,
        conn,
        Some(foreman),
        "reports/activity_form.html",
        json!({
            "foreman": UserDirectory::default().user_view(conn, foreman)?,
            "rows": (1..=MAX_DETAILS).collect::<Vec<_>>(),
            "components": components,
            "activity_codes": codes,
            "shifts": shifts,
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
    render_form(&templates, &session, &conn, &foreman, json!({}))
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
    let input = ActivityForm::parse(&data);

    match split_validation(submit_activity_report(&conn, &foreman, &input, db::now()))? {
        Ok(_) => {
            flash::success(
                &session,
                "Laporan aktivitas berhasil dibuat dan menunggu validasi leader!",
            )?;
            Ok(redirect(dashboard_path(foreman.role)))
        }
        Err(messages) => {
            flash_errors(&session, &messages)?;
            render_form(&templates, &session, &conn, &foreman, Value::Object(data.values()))
        }
    }
}

pub async fn detail(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let report = match activity::find_by_id(&conn, path.into_inner())? {
        Some(report) if can_view(&conn, &user, report.foreman_id)? => report,
        _ => {
            flash::error(&session, "Laporan tidak ditemukan atau Anda tidak memiliki akses.")?;
            return Ok(redirect(dashboard_path(user.role)));
        }
    };
    let view = ActivityView::build(&conn, &mut UserDirectory::default(), &report)?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&user),
        "reports/activity_detail.html",
        json!({"report": view}),
    )
}
