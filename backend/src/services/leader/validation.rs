//! Approve or reject a report of one of the leader's own foremen.

use crate::auth::{require_role, LEADERS};
use crate::db::Database;
use crate::error::AppError;
use crate::store::{activity, analysis, users};
use crate::web::form::FormData;
use crate::web::templates::Templates;
use crate::web::views::{ActivityView, AnalysisView, UserDirectory};
use crate::web::{flash, redirect, render_page};
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::model::choices::ReportStatus;
use common::model::user::User;
use log::info;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

const DASHBOARD: &str = "/leader/";

#[derive(Debug, Deserialize)]
pub struct ReportRef {
    #[serde(default)]
    report_id: Option<String>,
}

/// What the leader decided on the validation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "approve" => Some(Decision::Approve),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }

    pub fn status(&self) -> ReportStatus {
        match self {
            Decision::Approve => ReportStatus::Approved,
            Decision::Reject => ReportStatus::Rejected,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Decision::Approve => "disetujui",
            Decision::Reject => "ditolak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Activity,
    Analysis,
}

impl Kind {
    fn noun(&self) -> &'static str {
        match self {
            Kind::Activity => "aktivitas",
            Kind::Analysis => "analisis",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Kind::Activity => "leader/validate_activity.html",
            Kind::Analysis => "leader/validate_analysis.html",
        }
    }
}

/// Foreman id of report `id` when the report exists and its author reports
/// to `leader`.
fn owned_report(conn: &Connection, leader: &User, kind: Kind, id: i64) -> Result<Option<i64>, AppError> {
    let foreman_id = match kind {
        Kind::Activity => activity::find_by_id(conn, id)?.map(|r| r.foreman_id),
        Kind::Analysis => analysis::find_by_id(conn, id)?.map(|r| r.foreman_id),
    };
    let Some(foreman_id) = foreman_id else {
        return Ok(None);
    };
    let leader_id = users::find_by_id(conn, foreman_id)?.and_then(|f| f.leader_id);
    Ok((leader_id == Some(leader.id)).then_some(foreman_id))
}

/// Stores the decision and feedback. Returns false when the report is not
/// one the leader may validate.
pub fn validate_report(
    conn: &Connection,
    leader: &User,
    kind: Kind,
    id: i64,
    decision: Decision,
    feedback: &str,
) -> Result<bool, AppError> {
    if owned_report(conn, leader, kind, id)?.is_none() {
        return Ok(false);
    }
    match kind {
        Kind::Activity => activity::set_status(conn, id, decision.status(), feedback)?,
        Kind::Analysis => analysis::set_status(conn, id, decision.status(), feedback)?,
    }
    info!(
        "{} {} {} report {}",
        leader.username,
        decision.verb(),
        kind.noun(),
        id
    );
    Ok(true)
}

/// Resolves `?report_id=` to a report the leader owns, or flashes why not.
fn resolve(
    conn: &Connection,
    session: &Session,
    leader: &User,
    kind: Kind,
    query: &ReportRef,
) -> Result<Option<i64>, AppError> {
    let Some(id) = query.report_id.as_deref().and_then(|v| v.trim().parse::<i64>().ok()) else {
        flash::error(session, "ID laporan tidak ditemukan.")?;
        return Ok(None);
    };
    if owned_report(conn, leader, kind, id)?.is_none() {
        flash::error(session, "Laporan tidak ditemukan atau Anda tidak memiliki akses.")?;
        return Ok(None);
    }
    Ok(Some(id))
}

fn render(
    templates: &Templates,
    session: &Session,
    conn: &Connection,
    leader: &User,
    kind: Kind,
    id: i64,
) -> Result<HttpResponse, AppError> {
    let mut directory = UserDirectory::default();
    let report = match kind {
        Kind::Activity => json!(ActivityView::build(conn, &mut directory, &activity::get(conn, id)?)?),
        Kind::Analysis => json!(AnalysisView::build(conn, &mut directory, &analysis::get(conn, id)?)?),
    };
    render_page(templates, session, conn, Some(leader), kind.template(), json!({"report": report}))
}

fn show(
    db: &Database,
    templates: &Templates,
    session: &Session,
    kind: Kind,
    query: &ReportRef,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let leader = require_role(session, &conn, LEADERS)?;
    match resolve(&conn, session, &leader, kind, query)? {
        Some(id) => render(templates, session, &conn, &leader, kind, id),
        None => Ok(redirect(DASHBOARD)),
    }
}

fn submit(
    db: &Database,
    templates: &Templates,
    session: &Session,
    kind: Kind,
    query: &ReportRef,
    form: FormData,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    let leader = require_role(session, &conn, LEADERS)?;
    let Some(id) = resolve(&conn, session, &leader, kind, query)? else {
        return Ok(redirect(DASHBOARD));
    };
    let Some(decision) = form.get("action").and_then(Decision::parse) else {
        return render(templates, session, &conn, &leader, kind, id);
    };
    validate_report(&conn, &leader, kind, id, decision, &form.text("feedback"))?;
    flash::success(
        session,
        format!("Laporan {} berhasil {}.", kind.noun(), decision.verb()),
    )?;
    Ok(redirect(DASHBOARD))
}

pub async fn show_activity(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    query: web::Query<ReportRef>,
) -> Result<HttpResponse, AppError> {
    show(&db, &templates, &session, Kind::Activity, &query)
}

pub async fn validate_activity(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    query: web::Query<ReportRef>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = FormData::from(form.into_inner());
    submit(&db, &templates, &session, Kind::Activity, &query, form)
}

pub async fn show_analysis(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    query: web::Query<ReportRef>,
) -> Result<HttpResponse, AppError> {
    show(&db, &templates, &session, Kind::Analysis, &query)
}

pub async fn validate_analysis(
    db: web::Data<Database>,
    templates: web::Data<Templates>,
    session: Session,
    query: web::Query<ReportRef>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = FormData::from(form.into_inner());
    submit(&db, &templates, &session, Kind::Analysis, &query, form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use crate::store::activity::{NewActivityReport, NewDetail};
    use chrono::{NaiveDate, NaiveTime};
    use common::model::choices::{Role, Shift};

    fn report_for(conn: &Connection, foreman: &User) -> i64 {
        let time = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        activity::insert(
            conn,
            &NewActivityReport {
                foreman_id: foreman.id,
                date: NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
                shift: Shift::First,
                nrp: None,
                section: None,
                details: vec![NewDetail {
                    activity_number: 1,
                    unit_code: "DT-01".into(),
                    hm_km: None,
                    start_time: time(8),
                    stop_time: time(10),
                    component: None,
                    activities: "Ganti oli".into(),
                    activity_code: None,
                }],
            },
            now(),
        )
        .unwrap()
    }

    #[test]
    fn decisions_map_to_statuses() {
        assert_eq!(Decision::parse("approve").map(|d| d.status()), Some(ReportStatus::Approved));
        assert_eq!(Decision::parse("reject").map(|d| d.status()), Some(ReportStatus::Rejected));
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[test]
    fn leader_validates_only_own_foremen() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "lead", Role::Leader);
        let other = insert_user(&conn, "lead2", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        let id = report_for(&conn, &foreman);

        assert!(!validate_report(&conn, &other, Kind::Activity, id, Decision::Approve, "").unwrap());
        assert_eq!(activity::get(&conn, id).unwrap().status, ReportStatus::Pending);

        assert!(validate_report(&conn, &leader, Kind::Activity, id, Decision::Reject, "Foto kurang").unwrap());
        let saved = activity::get(&conn, id).unwrap();
        assert_eq!(saved.status, ReportStatus::Rejected);
        assert_eq!(saved.feedback.as_deref(), Some("Foto kurang"));
    }

    #[test]
    fn unknown_report_is_not_validated() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "lead", Role::Leader);
        assert!(!validate_report(&conn, &leader, Kind::Analysis, 99, Decision::Approve, "").unwrap());
    }
}
