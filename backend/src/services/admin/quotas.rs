//! Leader quota list and the create/edit form.

use crate::auth::{require_role, ADMINS};
use crate::db::{self, Database};
use crate::error::AppError;
use crate::forms::quota::{save_quota, QuotaForm};
use crate::services::{flash_errors, split_validation};
use crate::store::quotas;
use crate::web::form::FormData;
use crate::web::templates::Templates;
use crate::web::views::QuotaView;
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::quota::LeaderQuota;
use common::model::user::User;
use rusqlite::Connection;
use serde_json::json;

type Pairs = web::Form<Vec<(String, String)>>;

pub async fn list(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let quotas: Vec<QuotaView> = quotas::list_all(&conn)?.iter().map(QuotaView::from).collect();
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/quota_list.html",
        json!({"quotas": quotas}),
    )
}

fn quota_or_404(conn: &Connection, id: i64) -> Result<LeaderQuota, AppError> {
    quotas::find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Kuota leader"))
}

fn render_form(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    admin: &User,
    form: &QuotaForm,
    quota: Option<&LeaderQuota>,
) -> Result<HttpResponse, AppError> {
    render_page(
        templates,
        session,
        conn,
        Some(admin),
        "admin/quota_form.html",
        json!({
            "form": {
                "leader_name": form.leader_name,
                "leader_username": form.leader_username,
                "max_foreman": form.max_foreman,
                "is_active": form.is_active,
            },
            "quota": quota.map(QuotaView::from),
        }),
    )
}

pub async fn new_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let form = QuotaForm {
        is_active: true,
        ..Default::default()
    };
    render_form(&templates, &session, &conn, &admin, &form, None)
}

pub async fn edit_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let quota = quota_or_404(&conn, path.into_inner())?;
    render_form(&templates, &session, &conn, &admin, &QuotaForm::from_quota(&quota), Some(&quota))
}

fn submit(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    admin: &User,
    form: QuotaForm,
    quota: Option<&LeaderQuota>,
) -> Result<HttpResponse, AppError> {
    match split_validation(save_quota(conn, &form, quota, db::now()))? {
        Ok(_) => {
            flash::success(session, "Kuota leader berhasil diperbarui.")?;
            Ok(redirect("/superadmin/"))
        }
        Err(messages) => {
            flash_errors(session, &messages)?;
            render_form(templates, session, conn, admin, &form, quota)
        }
    }
}

pub async fn create(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    form: Pairs,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let form = QuotaForm::parse(&FormData::from(form.into_inner()));
    submit(&templates, &session, &conn, &admin, form, None)
}

pub async fn update(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
    form: Pairs,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let quota = quota_or_404(&conn, path.into_inner())?;
    let form = QuotaForm::parse(&FormData::from(form.into_inner()));
    submit(&templates, &session, &conn, &admin, form, Some(&quota))
}
