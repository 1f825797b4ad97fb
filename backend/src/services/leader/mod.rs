//! Leader dashboard and the approve/reject pages under `/leader`.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod dashboard;
mod validation;

const API_PATH: &str = "/leader";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/", get().to(dashboard::process))
        .route("/activity/", get().to(validation::show_activity))
        .route("/activity/", post().to(validation::validate_activity))
        .route("/analysis/", get().to(validation::show_analysis))
        .route("/analysis/", post().to(validation::validate_analysis))
}
