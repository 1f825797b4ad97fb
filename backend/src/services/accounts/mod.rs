//! Root-level routes: login, logout, the landing redirect and static assets.
//!
//! This scope has an empty prefix and therefore has to be mounted after
//! every other scope.

use crate::web::static_files::serve_embedded;
use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod home;
mod login;
mod logout;

const API_PATH: &str = "";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/", get().to(home::process))
        .route("/login/", get().to(login::show))
        .route("/login/", post().to(login::process))
        .route("/logout/", get().to(logout::process))
        .route("/logout/", post().to(logout::process))
        .route("/static/{path:.*}", get().to(serve_embedded))
}
