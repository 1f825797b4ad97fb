//! Administrator pages under `/superadmin`.
//!
//! Fixed paths are registered before the `/{user_id}/...` routes so that
//! `quota`, `export` and friends never reach the numeric user id matcher.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod choices;
mod dashboard;
mod exports;
mod notifications;
mod quotas;
mod users;

const API_PATH: &str = "/superadmin";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/", get().to(dashboard::process))
        .route("/create-user/", get().to(users::create_form))
        .route("/create-user/", post().to(users::create))
        // Leader quotas
        .route("/quota/", get().to(quotas::list))
        .route("/quota/manage/", get().to(quotas::new_form))
        .route("/quota/manage/", post().to(quotas::create))
        .route("/quota/manage/{quota_id}/", get().to(quotas::edit_form))
        .route("/quota/manage/{quota_id}/", post().to(quotas::update))
        // PDF exports
        .route("/pdf-export/", get().to(exports::page))
        .route("/export/activity-reports-pdf/", get().to(exports::activity_pdf))
        .route("/export/analysis-reports-pdf/", get().to(exports::analysis_pdf))
        .route(
            "/export/analysis-report/{report_id}/pdf/",
            get().to(exports::single_analysis_pdf),
        )
        // Notification center
        .route("/notifications/", get().to(notifications::center))
        .route("/notifications/broadcast/", get().to(notifications::broadcast_form))
        .route("/notifications/broadcast/", post().to(notifications::broadcast))
        .route("/notifications/analytics/", get().to(notifications::analytics))
        .route(
            "/notifications/bulk-activity-reminder/",
            post().to(notifications::bulk_activity),
        )
        .route(
            "/notifications/bulk-analysis-reminder/",
            post().to(notifications::bulk_analysis),
        )
        .route(
            "/notifications/activity-reminder/{user_id}/",
            post().to(notifications::activity_reminder),
        )
        .route(
            "/notifications/analysis-reminder/{user_id}/",
            post().to(notifications::analysis_reminder),
        )
        .route(
            "/users/{username}/notifications/",
            get().to(notifications::user_notifications),
        )
        // Employees
        .route("/{user_id}/", get().to(users::detail))
        .route("/{user_id}/edit/", get().to(users::edit_form))
        .route("/{user_id}/edit/", post().to(users::edit))
        .route("/{user_id}/delete/", get().to(users::delete_form))
        .route("/{user_id}/delete/", post().to(users::delete))
}
