use crate::auth::password::verify_password;
use crate::auth::{self, dashboard_path};
use crate::db::{self, Database};
use crate::error::AppError;
use crate::store::users;
use crate::web::templates::Templates;
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::user::User;
use log::{info, warn};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn show(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    if let Some(user) = auth::current_user(&session, &conn)? {
        return Ok(redirect(dashboard_path(user.role)));
    }
    render_page(&templates, &session, &conn, None, "login.html", json!({}))
}

/// Active account matching the credentials. A stored hash that cannot be
/// parsed counts as a wrong password.
fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<Option<User>, AppError> {
    let Some((user, hash)) = users::find_credentials(conn, username)? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }
    match verify_password(password, &hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => {
            warn!("Unreadable password hash for {}: {}", username, e);
            Ok(None)
        }
    }
}

pub async fn process(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        flash::error(&session, "Form tidak valid.")?;
        return render_page(
            &templates,
            &session,
            &conn,
            None,
            "login.html",
            json!({"username": username}),
        );
    }

    match authenticate(&conn, username, &form.password)? {
        Some(user) => {
            auth::login(&session, &user)?;
            users::record_login(&conn, user.id, db::now())?;
            info!("{} logged in", user.username);
            flash::success(&session, format!("Selamat datang, {}!", user.username))?;
            Ok(redirect(dashboard_path(user.role)))
        }
        None => {
            flash::error(&session, "Username atau password salah.")?;
            render_page(
                &templates,
                &session,
                &conn,
                None,
                "login.html",
                json!({"username": username}),
            )
        }
    }
}
