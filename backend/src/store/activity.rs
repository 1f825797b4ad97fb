use crate::db::{parse_col, parse_opt_col, shift_col};
use crate::error::AppError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::model::activity::{ActivityReport, ActivityReportDetail};
use common::model::choices::{ActivityCode, ReportStatus, Shift};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const REPORT_COLUMNS: &str =
    "id, foreman_id, date, shift, nrp, section, status, feedback, created_at";

/// One validated detail line ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDetail {
    pub activity_number: i64,
    pub unit_code: String,
    pub hm_km: Option<String>,
    pub start_time: NaiveTime,
    pub stop_time: NaiveTime,
    pub component: Option<String>,
    pub activities: String,
    pub activity_code: Option<ActivityCode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityReport {
    pub foreman_id: i64,
    pub date: NaiveDate,
    pub shift: Shift,
    pub nrp: Option<String>,
    pub section: Option<String>,
    pub details: Vec<NewDetail>,
}

/// Filter over activity reports. Unset fields do not restrict the result.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub foreman_id: Option<i64>,
    pub leader_id: Option<i64>,
    pub status: Option<ReportStatus>,
    pub validated_only: bool,
    pub date: Option<NaiveDate>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// `(year, month)`
    pub month: Option<(i32, u32)>,
    pub newest_created_first: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ActivityQuery {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        let mut push = |clause: &str, value: Value| {
            values.push(value);
            clauses.push(clause.replace('?', &format!("?{}", values.len())));
        };

        if let Some(id) = self.foreman_id {
            push("r.foreman_id = ?", Value::Integer(id));
        }
        if let Some(id) = self.leader_id {
            push("u.leader_id = ?", Value::Integer(id));
        }
        if let Some(status) = self.status {
            push("r.status = ?", Value::Text(status.as_str().to_owned()));
        }
        if let Some(date) = self.date {
            push("r.date = ?", Value::Text(date.to_string()));
        }
        if let Some(from) = self.date_from {
            push("r.date >= ?", Value::Text(from.to_string()));
        }
        if let Some(to) = self.date_to {
            push("r.date <= ?", Value::Text(to.to_string()));
        }
        if let Some((year, month)) = self.month {
            push(
                "strftime('%Y-%m', r.date) = ?",
                Value::Text(format!("{:04}-{:02}", year, month)),
            );
        }
        if self.validated_only {
            clauses.push("r.status IN ('approved', 'rejected')".to_owned());
        }

        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (sql, values)
    }
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<ActivityReport> {
    Ok(ActivityReport {
        id: row.get("id")?,
        foreman_id: row.get("foreman_id")?,
        date: row.get("date")?,
        shift: shift_col(row, "shift")?,
        nrp: row.get("nrp")?,
        section: row.get("section")?,
        status: parse_col(row, "status")?,
        feedback: row.get("feedback")?,
        created_at: row.get("created_at")?,
        details: Vec::new(),
    })
}

fn map_detail(row: &Row<'_>) -> rusqlite::Result<ActivityReportDetail> {
    Ok(ActivityReportDetail {
        id: row.get("id")?,
        activity_report_id: row.get("activity_report_id")?,
        activity_number: row.get("activity_number")?,
        unit_code: row.get("unit_code")?,
        hm_km: row.get("hm_km")?,
        start_time: row.get("start_time")?,
        stop_time: row.get("stop_time")?,
        component: row.get("component")?,
        activities: row.get("activities")?,
        activity_code: parse_opt_col(row, "activity_code")?,
    })
}

fn load_details(conn: &Connection, report: &mut ActivityReport) -> Result<(), AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, activity_report_id, activity_number, unit_code, hm_km, start_time, stop_time, \
         component, activities, activity_code FROM activity_report_details \
         WHERE activity_report_id = ?1 ORDER BY activity_number",
    )?;
    report.details = stmt
        .query_map([report.id], map_detail)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(())
}

/// Stores the header and its detail rows atomically.
pub fn insert(
    conn: &Connection,
    report: &NewActivityReport,
    now: NaiveDateTime,
) -> Result<i64, AppError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO activity_reports (foreman_id, date, shift, nrp, section, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
        params![
            report.foreman_id,
            report.date,
            report.shift.as_i64(),
            report.nrp,
            report.section,
            now
        ],
    )?;
    let id = tx.last_insert_rowid();
    for detail in &report.details {
        tx.execute(
            "INSERT INTO activity_report_details (activity_report_id, activity_number, unit_code, \
             hm_km, start_time, stop_time, component, activities, activity_code) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                detail.activity_number,
                detail.unit_code,
                detail.hm_km,
                detail.start_time,
                detail.stop_time,
                detail.component,
                detail.activities,
                detail.activity_code.map(|c| c.as_str()),
            ],
        )?;
    }
    tx.commit()?;
    Ok(id)
}

pub fn exists_for(conn: &Connection, foreman_id: i64, date: NaiveDate) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM activity_reports WHERE foreman_id = ?1 AND date = ?2",
        params![foreman_id, date],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<ActivityReport>, AppError> {
    let sql = format!("SELECT {} FROM activity_reports WHERE id = ?1", REPORT_COLUMNS);
    let report = conn.query_row(&sql, [id], map_report).optional()?;
    match report {
        Some(mut report) => {
            load_details(conn, &mut report)?;
            Ok(Some(report))
        }
        None => Ok(None),
    }
}

pub fn get(conn: &Connection, id: i64) -> Result<ActivityReport, AppError> {
    find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Activity report"))
}

/// Reports matching `query`, details included, newest date first.
pub fn list(conn: &Connection, query: &ActivityQuery) -> Result<Vec<ActivityReport>, AppError> {
    let (where_sql, values) = query.where_clause();
    let order = if query.newest_created_first {
        "r.created_at DESC, r.id DESC"
    } else {
        "r.date DESC, r.created_at DESC, r.id DESC"
    };
    let mut sql = format!(
        "SELECT r.id, r.foreman_id, r.date, r.shift, r.nrp, r.section, r.status, r.feedback, \
         r.created_at FROM activity_reports r JOIN users u ON u.id = r.foreman_id {} ORDER BY {}",
        where_sql, order
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, query.offset.unwrap_or(0)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut reports = stmt
        .query_map(params_from_iter(values.iter()), map_report)?
        .collect::<Result<Vec<_>, _>>()?;
    for report in &mut reports {
        load_details(conn, report)?;
    }
    Ok(reports)
}

pub fn count(conn: &Connection, query: &ActivityQuery) -> Result<i64, AppError> {
    let (where_sql, values) = query.where_clause();
    let sql = format!(
        "SELECT COUNT(*) FROM activity_reports r JOIN users u ON u.id = r.foreman_id {}",
        where_sql
    );
    Ok(conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?)
}

pub fn set_status(
    conn: &Connection,
    id: i64,
    status: ReportStatus,
    feedback: &str,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE activity_reports SET status = ?1, feedback = ?2 WHERE id = ?3",
        params![status.as_str(), feedback, id],
    )?;
    Ok(())
}
