use crate::auth::require_user;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::store::notifications;
use crate::web::templates::Templates;
use crate::web::views::{NotificationView, UserDirectory};
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde_json::json;

const INBOX: &str = "/notifications/";

pub async fn list(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let mut directory = UserDirectory::default();
    let items = notifications::list_for_user(&conn, user.id, None)?
        .iter()
        .map(|n| NotificationView::with_names(&conn, &mut directory, n))
        .collect::<Result<Vec<_>, _>>()?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&user),
        "notifications/list.html",
        json!({
            "notifications": items,
            "unread_count": notifications::unread_count(&conn, user.id)?,
        }),
    )
}

/// Marks one of the user's notifications as read and returns to the inbox.
pub async fn read(
    db: web::Data<Database>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let notification = notifications::find_for_user(&conn, path.into_inner(), user.id)?
        .ok_or_else(|| AppError::not_found("Notifikasi"))?;
    notifications::mark_as_read(&conn, notification.id, db::now())?;
    Ok(redirect(INBOX))
}

pub async fn mark_all_read(db: web::Data<Database>, session: Session) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let changed = notifications::mark_all_as_read(&conn, user.id, db::now())?;
    flash::success(
        &session,
        format!("{} notifikasi ditandai sudah dibaca.", changed),
    )?;
    Ok(redirect(INBOX))
}

pub async fn acknowledge(
    db: web::Data<Database>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let notification = notifications::find_for_user(&conn, path.into_inner(), user.id)?
        .ok_or_else(|| AppError::not_found("Notifikasi"))?;
    notifications::mark_as_acknowledged(&conn, notification.id, db::now())?;
    flash::success(&session, "Notifikasi telah dikonfirmasi.")?;
    Ok(redirect(INBOX))
}
