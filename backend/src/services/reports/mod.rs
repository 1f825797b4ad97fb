//! Report entry by foremen and the shared read access rules.
//!
//! A report is visible to the foreman who wrote it, to that foreman's leader
//! and to administrators.

use actix_web::web::{get, post, scope};
use actix_web::Scope;
use common::model::user::User;
use rusqlite::Connection;

use crate::error::AppError;
use crate::store::users;

pub(crate) mod activity;
pub(crate) mod analysis;

pub fn configure_activity_routes() -> Scope {
    scope("/activity-report")
        .route("/create/", get().to(activity::create_form))
        .route("/create/", post().to(activity::create))
}

pub fn configure_analysis_routes() -> Scope {
    scope("/analysis-report")
        .route("/create/", get().to(analysis::create_form))
        .route("/create/", post().to(analysis::create))
        .route("/{report_id}/image/{slot}/", get().to(analysis::image))
}

/// Whether `viewer` may read a report written by `foreman_id`.
pub(crate) fn can_view(conn: &Connection, viewer: &User, foreman_id: i64) -> Result<bool, AppError> {
    if viewer.role.is_admin() || viewer.id == foreman_id {
        return Ok(true);
    }
    let leader_id = users::find_by_id(conn, foreman_id)?.and_then(|f| f.leader_id);
    Ok(leader_id == Some(viewer.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use common::model::choices::{Role, Shift};

    #[test]
    fn owner_leader_and_admins_can_view() {
        let conn = memory_conn();
        let admin = insert_user(&conn, "admin", Role::Admin);
        let leader = insert_user(&conn, "lead", Role::Leader);
        let other_leader = insert_user(&conn, "lead2", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        let stranger = insert_foreman(&conn, "mek2", other_leader.id, Shift::First);

        assert!(can_view(&conn, &foreman, foreman.id).unwrap());
        assert!(can_view(&conn, &leader, foreman.id).unwrap());
        assert!(can_view(&conn, &admin, foreman.id).unwrap());
        assert!(!can_view(&conn, &other_leader, foreman.id).unwrap());
        assert!(!can_view(&conn, &stranger, foreman.id).unwrap());
    }
}
