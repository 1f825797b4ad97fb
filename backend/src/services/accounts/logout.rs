use crate::auth;
use crate::error::AppError;
use crate::web::{flash, redirect};
use actix_session::Session;
use actix_web::HttpResponse;

pub async fn process(session: Session) -> Result<HttpResponse, AppError> {
    auth::logout(&session);
    flash::success(&session, "Anda telah berhasil logout.")?;
    Ok(redirect("/login/"))
}
