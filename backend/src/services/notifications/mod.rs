//! The logged-in user's own notifications.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod inbox;

const API_PATH: &str = "/notifications";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/", get().to(inbox::list))
        .route("/mark-all-read/", post().to(inbox::mark_all_read))
        .route("/{notification_id}/read/", get().to(inbox::read))
        .route("/{notification_id}/read/", post().to(inbox::read))
        .route("/{notification_id}/acknowledge/", post().to(inbox::acknowledge))
}
