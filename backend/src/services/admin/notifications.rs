//! Notification center of the administrators: foreman monitor, manual and
//! bulk reminders, custom broadcasts and sending statistics.
//!
//! The reminder and broadcast endpoints are called from the page scripts and
//! answer with an [`ActionResponse`].

use crate::auth::{require_role, ADMINS};
use crate::broadcast::{self, Outcome};
use crate::config::REQUIRED_ANALYSIS_REPORTS;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::services::deliver;
use crate::store::{analysis, notifications, users};
use crate::telegram::Telegram;
use crate::web::render_page;
use crate::web::templates::Templates;
use crate::web::views::{NotificationView, UserDirectory};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Datelike;
use common::model::notification::Priority;
use common::model::user::User;
use common::requests::{ActionResponse, CustomNotificationRequest};
use serde_json::json;

const RECENT_LIMIT: i64 = 20;

pub async fn center(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let today = db::now().date();
    let (foremen, summary) = broadcast::foremen_status(&conn, today)?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/notification_center.html",
        json!({
            "foremen_status": foremen,
            "summary": summary,
            "today": today,
            "required_analysis": REQUIRED_ANALYSIS_REPORTS,
        }),
    )
}

pub async fn broadcast_form(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let mut directory = UserDirectory::default();
    let recipients = users::list_all(&conn)?
        .iter()
        .filter(|u| u.is_active)
        .map(|u| directory.user_view(&conn, u))
        .collect::<Result<Vec<_>, _>>()?;
    let priorities: Vec<_> = Priority::ALL
        .iter()
        .map(|p| json!({"value": p.as_str(), "label": p.label()}))
        .collect();
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/broadcast.html",
        json!({"recipients": recipients, "priorities": priorities}),
    )
}

pub async fn broadcast(
    db: web::Data<Database>,
    telegram: web::Data<Telegram>,
    session: Session,
    request: web::Json<CustomNotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    match broadcast::send_custom_notification(&conn, &admin, &request, db::now())? {
        Ok(delivered) => {
            deliver(&telegram, &delivered);
            Ok(HttpResponse::Ok().json(ActionResponse {
                notification_ids: delivered.iter().map(|(_, n)| n.id).collect(),
                ..ActionResponse::ok(format!(
                    "Notifikasi berhasil dikirim ke {} user",
                    delivered.len()
                ))
            }))
        }
        Err(message) => Ok(HttpResponse::BadRequest().json(ActionResponse::refused(message))),
    }
}

fn answer(
    telegram: &Telegram,
    outcome: Outcome,
    message: impl FnOnce(&User) -> String,
) -> HttpResponse {
    match outcome {
        Outcome::Sent(user, notification) => {
            telegram.dispatch(&user, &notification);
            HttpResponse::Ok().json(ActionResponse {
                notification_id: Some(notification.id),
                ..ActionResponse::ok(message(&user))
            })
        }
        Outcome::Refused(reason) => HttpResponse::Ok().json(ActionResponse::refused(reason)),
    }
}

pub async fn activity_reminder(
    db: web::Data<Database>,
    telegram: web::Data<Telegram>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let outcome = broadcast::manual_activity_reminder(&conn, &admin, path.into_inner(), db::now())?;
    Ok(answer(&telegram, outcome, |user| {
        format!("Reminder activity berhasil dikirim ke {}", user.display_name())
    }))
}

pub async fn analysis_reminder(
    db: web::Data<Database>,
    telegram: web::Data<Telegram>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let now = db::now();
    let outcome = broadcast::manual_analysis_reminder(&conn, &admin, path.into_inner(), now)?;
    let missing = match &outcome {
        Outcome::Sent(user, _) => {
            let done = analysis::count_in_month(&conn, user.id, now.year(), now.month())?;
            (REQUIRED_ANALYSIS_REPORTS - done).max(0)
        }
        Outcome::Refused(_) => 0,
    };
    Ok(answer(&telegram, outcome, |user| {
        format!(
            "Reminder analysis berhasil dikirim ke {} (kurang {} laporan)",
            user.display_name(),
            missing
        )
    }))
}

pub async fn bulk_activity(
    db: web::Data<Database>,
    telegram: web::Data<Telegram>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    let delivered = broadcast::bulk_activity_reminder(&conn, db::now())?;
    deliver(&telegram, &delivered);
    Ok(HttpResponse::Ok().json(ActionResponse::ok(format!(
        "Reminder activity berhasil dikirim ke {} foremen",
        delivered.len()
    ))))
}

pub async fn bulk_analysis(
    db: web::Data<Database>,
    telegram: web::Data<Telegram>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    let delivered = broadcast::bulk_analysis_reminder(&conn, db::now())?;
    deliver(&telegram, &delivered);
    Ok(HttpResponse::Ok().json(ActionResponse::ok(format!(
        "Reminder analysis berhasil dikirim ke {} foremen",
        delivered.len()
    ))))
}

pub async fn analytics(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let mut directory = UserDirectory::default();
    let recent = notifications::recent_manual(&conn, RECENT_LIMIT)?
        .iter()
        .map(|n| NotificationView::with_names(&conn, &mut directory, n))
        .collect::<Result<Vec<_>, _>>()?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/notification_analytics.html",
        json!({
            "stats": notifications::manual_stats(&conn)?,
            "recent_notifications": recent,
        }),
    )
}

pub async fn user_notifications(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let admin = require_role(&session, &conn, ADMINS)?;
    let username = path.into_inner();
    let target = users::find_by_username(&conn, &username)?
        .ok_or_else(|| AppError::not_found(format!("User {}", username)))?;
    let mut directory = UserDirectory::default();
    let items = notifications::list_for_user(&conn, target.id, None)?
        .iter()
        .map(|n| NotificationView::with_names(&conn, &mut directory, n))
        .collect::<Result<Vec<_>, _>>()?;
    render_page(
        &templates,
        &session,
        &conn,
        Some(&admin),
        "admin/user_notifications.html",
        json!({
            "target_user": directory.user_view(&conn, &target)?,
            "notifications": items,
            "unread_count": notifications::unread_count(&conn, target.id)?,
        }),
    )
}
