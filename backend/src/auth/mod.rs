//! # Authentication
//!
//! The logged-in user is identified by the `user_id` stored in the signed
//! session cookie. Handlers call [`require_role`] first; it turns a missing
//! session into a redirect to the login page and a wrong role into a flash
//! message plus a redirect to the caller's own dashboard.

pub mod password;

use crate::error::AppError;
use crate::store::users;
use crate::web::flash::{self, Level};
use actix_session::Session;
use common::model::choices::Role;
use common::model::user::User;
use rusqlite::Connection;

const USER_ID_KEY: &str = "user_id";

/// Landing page of each role.
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin | Role::Superadmin => "/superadmin/",
        Role::Leader => "/leader/",
        Role::Foreman => "/mekanik/",
    }
}

pub fn login(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    session.insert(USER_ID_KEY, user.id)?;
    Ok(())
}

/// Drops every session value but keeps the cookie so a flash can follow.
pub fn logout(session: &Session) {
    session.clear();
    session.renew();
}

/// The active account bound to the session, if any.
pub fn current_user(session: &Session, conn: &Connection) -> Result<Option<User>, AppError> {
    let Some(id) = session.get::<i64>(USER_ID_KEY)? else {
        return Ok(None);
    };
    Ok(users::find_by_id(conn, id)?.filter(|user| user.is_active))
}

pub fn require_user(session: &Session, conn: &Connection) -> Result<User, AppError> {
    current_user(session, conn)?.ok_or(AppError::Unauthenticated)
}

/// The current user if their role is one of `allowed`.
pub fn require_role(
    session: &Session,
    conn: &Connection,
    allowed: &[Role],
) -> Result<User, AppError> {
    let user = require_user(session, conn)?;
    if allowed.contains(&user.role) {
        return Ok(user);
    }
    flash::push(
        session,
        Level::Error,
        "Anda tidak memiliki akses ke halaman ini.",
    )?;
    Err(AppError::Forbidden {
        redirect_to: dashboard_path(user.role),
    })
}

pub const ADMINS: &[Role] = &[Role::Admin, Role::Superadmin];
pub const LEADERS: &[Role] = &[Role::Leader];
pub const FOREMEN: &[Role] = &[Role::Foreman];
