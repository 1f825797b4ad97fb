//! Employee accounts: create, view, edit, delete.

use super::choices::with_choices;
use crate::auth::{require_role, ADMINS};
use crate::db::{self, Database};
use crate::error::AppError;
use crate::forms::user::{create_user_with_role, delete_user, update_user, UserForm};
use crate::services::{flash_errors, split_validation};
use crate::store::users;
use crate::web::form::FormData;
use crate::web::templates::Templates;
use crate::web::views::UserDirectory;
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde_json::json;

type Pairs = web::Form<Vec<(String, String)>>;

pub async fn create_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let context = with_choices(&conn, json!({}))?;
    render_page(&templates, &session, &conn, Some(&admin), "admin/create_user.html", context)
}

pub async fn create(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    form: Pairs,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let form = FormData::from(form.into_inner());
    let input = UserForm::parse(&form);

    match split_validation(create_user_with_role(&conn, &input, db::now()))? {
        Ok(user) => {
            flash::success(
                &session,
                format!(
                    "User {} berhasil dibuat dengan role {}!",
                    user.display_name(),
                    user.role
                ),
            )?;
            Ok(redirect("/superadmin/"))
        }
        Err(messages) => {
            flash_errors(&session, &messages[..messages.len().min(1)])?;
            let context = with_choices(&conn, json!({"form": form_values(&input)}))?;
            render_page(&templates, &session, &conn, Some(&admin), "admin/create_user.html", context)
        }
    }
}

/// Submitted values echoed back into a form that failed validation.
fn form_values(input: &UserForm) -> serde_json::Value {
    json!({
        "username": input.username,
        "email": input.email,
        "first_name": input.first_name,
        "last_name": input.last_name,
        "name": input.name,
        "phone": input.phone,
        "nrp": input.nrp,
        "telegram_chat_id": input.telegram_chat_id,
        "role": input.role.map(|r| r.as_str()),
        "department": input.department.map(|d| d.as_str()),
        "shift": input.shift.map(|s| s.as_i64()),
        "leader": input.leader_id,
        "is_active": input.is_active,
    })
}

pub async fn detail(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let employee = users::get(&conn, path.into_inner())?;
    let view = UserDirectory::default().user_view(&conn, &employee)?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/user_detail.html",
        json!({"employee": view}),
    )
}

pub async fn edit_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let employee = users::get(&conn, path.into_inner())?;
    let view = UserDirectory::default().user_view(&conn, &employee)?;
    let context = with_choices(&conn, json!({"employee": view}))?;
    render_page(&templates, &session, &conn, Some(&admin), "admin/user_edit.html", context)
}

pub async fn edit(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
    form: Pairs,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let employee = users::get(&conn, path.into_inner())?;
    let input = UserForm::parse(&FormData::from(form.into_inner()));

    match split_validation(update_user(&conn, &employee, &input, db::now()))? {
        Ok(updated) => {
            flash::success(
                &session,
                format!("Data karyawan {} berhasil diupdate!", updated.username),
            )?;
            Ok(redirect(format!("/superadmin/{}/", updated.id)))
        }
        Err(messages) => {
            flash::error(
                &session,
                format!("Terjadi kesalahan dalam update data: {}", messages.join("; ")),
            )?;
            let view = UserDirectory::default().user_view(&conn, &employee)?;
            let context = with_choices(&conn, json!({"employee": view, "form": form_values(&input)}))?;
            render_page(&templates, &session, &conn, Some(&admin), "admin/user_edit.html", context)
        }
    }
}

pub async fn delete_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let employee = users::get(&conn, path.into_inner())?;
    let view = UserDirectory::default().user_view(&conn, &employee)?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/user_delete.html",
        json!({"employee": view}),
    )
}

pub async fn delete(
    db: web::Data<Database>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    let employee = users::get(&conn, path.into_inner())?;
    delete_user(&conn, &employee, db::now())?;
    flash::success(&session, format!("Karyawan {} berhasil dihapus!", employee.username))?;
    Ok(redirect("/superadmin/"))
}
