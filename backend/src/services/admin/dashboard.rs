use crate::auth::{require_role, ADMINS};
use crate::db::Database;
use crate::error::AppError;
use crate::store::activity::{self, ActivityQuery};
use crate::store::{quotas, users};
use crate::web::templates::Templates;
use crate::web::views::{ActivityView, QuotaView, UserDirectory};
use crate::web::render_page;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::choices::{ReportStatus, Role};
use serde_json::json;

pub async fn process(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let user = require_role(&session, &conn, ADMINS)?;
    let mut directory = UserDirectory::default();

    let pending = activity::list(
        &conn,
        &ActivityQuery {
            status: Some(ReportStatus::Pending),
            ..Default::default()
        },
    )?;
    let validated = activity::list(
        &conn,
        &ActivityQuery {
            validated_only: true,
            ..Default::default()
        },
    )?;
    let all_users = users::list_all(&conn)?
        .iter()
        .map(|u| directory.user_view(&conn, u))
        .collect::<Result<Vec<_>, _>>()?;
    let leader_quotas: Vec<QuotaView> = quotas::list_all(&conn)?.iter().map(QuotaView::from).collect();
    let foremen = users::list_by_role(&conn, Role::Foreman, true)?
        .iter()
        .map(|u| directory.user_view(&conn, u))
        .collect::<Result<Vec<_>, _>>()?;

    let stats = json!({
        "total_users": users::count_all(&conn)?,
        "total_leaders": users::count_by_role(&conn, Role::Leader)?,
        "total_foremen": users::count_by_role(&conn, Role::Foreman)?,
        "pending_reports": pending.len(),
        "validated_reports": validated.len(),
    });

    render_page(
        &templates,
        &session,
        &conn,
        Some(&user),
        "admin/dashboard.html",
        json!({
            "stats": stats,
            "pending_activity_reports": ActivityView::build_all(&conn, &mut directory, &pending)?,
            "validated_activity_reports": ActivityView::build_all(&conn, &mut directory, &validated)?,
            "all_users": all_users,
            "leader_quotas": leader_quotas,
            "foremen": foremen,
        }),
    )
}
