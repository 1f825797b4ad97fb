//! JSON endpoints called from the page scripts.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod notifications;
mod quota;

const API_PATH: &str = "/api";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/check-leader-quota/", post().to(quota::check))
        .route("/notifications/", get().to(notifications::feed))
        .route("/notifications/{notification_id}/read/", post().to(notifications::mark_read))
}
