use crate::auth::{self, dashboard_path};
use crate::db::Database;
use crate::error::AppError;
use crate::web::redirect;
use actix_session::Session;
use actix_web::{web, HttpResponse};

/// Sends visitors to their dashboard, or to the login page.
pub async fn process(db: web::Data<Database>, session: Session) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    Ok(match auth::current_user(&session, &conn)? {
        Some(user) => redirect(dashboard_path(user.role)),
        None => redirect("/login/"),
    })
}
