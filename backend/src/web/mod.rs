//! # Web layer helpers
//!
//! Shared pieces of the HTML handlers: template rendering with the common
//! page context, flash messages, form parsing, embedded static assets and the
//! view models handed to the templates.
//!
//! Every rendered page receives `messages` (pending flashes), and when a
//! user is logged in also `current_user`, `dashboard_url` and
//! `unread_notifications_count` for the navigation bar.

pub mod flash;
pub mod form;
pub mod static_files;
pub mod templates;
pub mod upload;
pub mod views;

use crate::auth::dashboard_path;
use crate::error::AppError;
use crate::store::notifications;
use actix_session::Session;
use actix_web::http::header;
use actix_web::HttpResponse;
use common::model::user::User;
use rusqlite::Connection;
use serde_json::{json, Value};
use templates::Templates;
use views::UserView;

/// Renders `name` with `context` merged into the common page context.
pub fn render_page(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    user: Option<&User>,
    name: &str,
    context: Value,
) -> Result<HttpResponse, AppError> {
    let mut page = match context {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_owned(), other);
            map
        }
    };
    page.insert("messages".to_owned(), json!(flash::take(session)?));
    if let Some(user) = user {
        page.insert("current_user".to_owned(), json!(UserView::new(user, None)));
        page.insert("dashboard_url".to_owned(), json!(dashboard_path(user.role)));
        page.insert(
            "unread_notifications_count".to_owned(),
            json!(notifications::unread_count(conn, user.id)?),
        );
    }

    let html = templates.render(name, Value::Object(page))?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// `303 See Other` to `location`, the answer to every successful form post.
pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}
