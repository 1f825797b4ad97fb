use crate::auth::{require_role, ADMINS};
use crate::db::Database;
use crate::error::AppError;
use crate::store::quotas;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use common::requests::{CheckLeaderQuotaRequest, CheckLeaderQuotaResponse, QuotaInfo};
use rusqlite::Connection;

/// Whether `username` is reserved by an active leader quota, and its capacity.
pub fn lookup(conn: &Connection, username: &str) -> Result<CheckLeaderQuotaResponse, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Ok(CheckLeaderQuotaResponse {
            is_registered: false,
            quota_info: None,
            message: "Username tidak boleh kosong".to_owned(),
        });
    }
    let is_registered = quotas::is_username_registered(conn, username)?;
    let quota_info = if is_registered {
        quotas::get_quota_by_username(conn, username)?.map(|quota| QuotaInfo {
            available_slots: quota.available_slots(),
            leader_name: quota.leader_name,
            max_foreman: quota.max_foreman,
            current_count: quota.current_foreman_count,
        })
    } else {
        None
    };
    Ok(CheckLeaderQuotaResponse {
        is_registered,
        quota_info,
        message: if is_registered {
            "Username terdaftar".to_owned()
        } else {
            "Username belum terdaftar".to_owned()
        },
    })
}

pub async fn check(
    db: web::Data<Database>,
    session: Session,
    request: web::Json<CheckLeaderQuotaRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = db.conn()?;
    require_role(&session, &conn, ADMINS)?;
    Ok(HttpResponse::Ok().json(lookup(&conn, &request.username)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::memory_conn;
    use crate::store::quotas::QuotaRecord;

    #[test]
    fn empty_username_is_not_registered() {
        let conn = memory_conn();
        let answer = lookup(&conn, "  ").unwrap();
        assert!(!answer.is_registered);
        assert_eq!(answer.message, "Username tidak boleh kosong");
    }

    #[test]
    fn registered_username_reports_capacity() {
        let conn = memory_conn();
        quotas::insert(
            &conn,
            &QuotaRecord {
                leader_name: "Andi".into(),
                leader_username: "andi".into(),
                max_foreman: 4,
                is_active: true,
            },
            now(),
        )
        .unwrap();

        let answer = lookup(&conn, "andi").unwrap();
        assert!(answer.is_registered);
        assert_eq!(
            answer.quota_info,
            Some(QuotaInfo {
                leader_name: "Andi".into(),
                max_foreman: 4,
                current_count: 0,
                available_slots: 4,
            })
        );
        assert_eq!(lookup(&conn, "budi").unwrap().message, "Username belum terdaftar");
    }
}
