//! Foreman pages: the `/mekanik` dashboard and report list, plus the
//! `/foreman` paths for report detail, TAR step 2 and the status overview.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

use crate::services::reports::{activity, analysis};

mod dashboard;
mod list;

pub fn configure_routes() -> Scope {
    scope("/mekanik")
        .route("/", get().to(dashboard::process))
        .route("/reports/", get().to(list::reports))
}

pub fn configure_workspace_routes() -> Scope {
    scope("/foreman")
        .route("/activity-report/{report_id}/", get().to(activity::detail))
        .route(
            "/create-analysis-report/step2/{report_id}/",
            get().to(analysis::step2_form),
        )
        .route(
            "/create-analysis-report/step2/{report_id}/",
            post().to(analysis::step2),
        )
        .route("/report-status/", get().to(list::status))
}
