//! CSV downloads for administrators.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod downloads;

const API_PATH: &str = "/export";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/reports/", get().to(downloads::reports))
        .route("/users/", get().to(downloads::users))
}
