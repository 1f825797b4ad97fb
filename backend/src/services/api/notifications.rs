use crate::auth::require_user;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::store::notifications;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::notification::NotificationSummary;
use common::requests::{MarkReadResponse, NotificationFeed};

const FEED_SIZE: i64 = 5;

/// Unread count and the latest notifications for the navigation bell.
pub async fn feed(db: web::Data<Database>, session: Session) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let latest = notifications::list_for_user(&conn, user.id, Some(FEED_SIZE))?;
    Ok(HttpResponse::Ok().json(NotificationFeed {
        unread_count: notifications::unread_count(&conn, user.id)?,
        notifications: latest.iter().map(NotificationSummary::from).collect(),
    }))
}

pub async fn mark_read(
    db: web::Data<Database>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_user(&session, &conn)?;
    let Some(notification) = notifications::find_for_user(&conn, path.into_inner(), user.id)? else {
        return Ok(HttpResponse::NotFound().json(MarkReadResponse {
            success: false,
            unread_count: notifications::unread_count(&conn, user.id)?,
            message: "Notifikasi tidak ditemukan".to_owned(),
        }));
    };
    notifications::mark_as_read(&conn, notification.id, db::now())?;
    Ok(HttpResponse::Ok().json(MarkReadResponse {
        success: true,
        unread_count: notifications::unread_count(&conn, user.id)?,
        message: "Notification marked as read".to_owned(),
    }))
}
