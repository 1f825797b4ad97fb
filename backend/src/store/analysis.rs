use crate::db::parse_col;
use crate::error::AppError;
use chrono::{NaiveDate, NaiveDateTime};
use common::model::analysis::{AnalysisReport, DocumentationSlot};
use common::model::choices::ReportStatus;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const REPORT_COLUMNS: &str = "r.id, r.foreman_id, r.section_track, r.email, r.no_report, \
     r.report_date, r.wo_number, r.wo_date, r.unit_code, r.problem, r.trouble_date, r.hm, \
     r.title_problem, r.part_no, r.part_name, r.status, r.feedback, r.created_at, \
     r.component_function, r.symptoms, r.root_cause, r.factor_man, r.factor_material, \
     r.factor_machine, r.factor_method, r.factor_environment, r.action_taken, \
     r.preventive_action, r.documentation_before IS NOT NULL AS has_before, \
     r.documentation_after IS NOT NULL AS has_after";

/// Header fields captured on the first step of the form.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisHeader {
    pub foreman_id: i64,
    pub section_track: Option<String>,
    pub email: Option<String>,
    pub no_report: Option<String>,
    pub report_date: NaiveDate,
    pub wo_number: Option<String>,
    pub wo_date: NaiveDate,
    pub unit_code: Option<String>,
    pub problem: Option<String>,
    pub trouble_date: NaiveDate,
    pub hm: Option<String>,
    pub title_problem: String,
    pub part_no: Option<String>,
    pub part_name: Option<String>,
}

/// Narrative fields captured on the second step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisDetails {
    pub component_function: Option<String>,
    pub symptoms: Option<String>,
    pub root_cause: Option<String>,
    pub factor_man: Option<String>,
    pub factor_material: Option<String>,
    pub factor_machine: Option<String>,
    pub factor_method: Option<String>,
    pub factor_environment: Option<String>,
    pub action_taken: Option<String>,
    pub preventive_action: Option<String>,
}

/// A stored documentation image.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisQuery {
    pub foreman_id: Option<i64>,
    pub leader_id: Option<i64>,
    pub status: Option<ReportStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// `(year, month)` of `report_date`
    pub month: Option<(i32, u32)>,
    pub limit: Option<i64>,
}

impl AnalysisQuery {
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
        if let Some(from) = self.date_from {
            push("r.report_date >= ?", Value::Text(from.to_string()));
        }
        if let Some(to) = self.date_to {
            push("r.report_date <= ?", Value::Text(to.to_string()));
        }
        if let Some((year, month)) = self.month {
            push(
                "strftime('%Y-%m', r.report_date) = ?",
                Value::Text(format!("{:04}-{:02}", year, month)),
            );
        }

        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (sql, values)
    }
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<AnalysisReport> {
    Ok(AnalysisReport {
        id: row.get("id")?,
        foreman_id: row.get("foreman_id")?,
        section_track: row.get("section_track")?,
        email: row.get("email")?,
        no_report: row.get("no_report")?,
        report_date: row.get("report_date")?,
        wo_number: row.get("wo_number")?,
        wo_date: row.get("wo_date")?,
        unit_code: row.get("unit_code")?,
        problem: row.get("problem")?,
        trouble_date: row.get("trouble_date")?,
        hm: row.get("hm")?,
        title_problem: row.get("title_problem")?,
        part_no: row.get("part_no")?,
        part_name: row.get("part_name")?,
        status: parse_col(row, "status")?,
        feedback: row.get("feedback")?,
        created_at: row.get("created_at")?,
        component_function: row.get("component_function")?,
        symptoms: row.get("symptoms")?,
        root_cause: row.get("root_cause")?,
        factor_man: row.get("factor_man")?,
        factor_material: row.get("factor_material")?,
        factor_machine: row.get("factor_machine")?,
        factor_method: row.get("factor_method")?,
        factor_environment: row.get("factor_environment")?,
        action_taken: row.get("action_taken")?,
        preventive_action: row.get("preventive_action")?,
        has_documentation_before: row.get("has_before")?,
        has_documentation_after: row.get("has_after")?,
    })
}

pub fn insert(
    conn: &Connection,
    header: &AnalysisHeader,
    now: NaiveDateTime,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO analysis_reports (foreman_id, section_track, email, no_report, report_date, \
         wo_number, wo_date, unit_code, problem, trouble_date, hm, title_problem, part_no, \
         part_name, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 'pending', ?15)",
        params![
            header.foreman_id,
            header.section_track,
            header.email,
            header.no_report,
            header.report_date,
            header.wo_number,
            header.wo_date,
            header.unit_code,
            header.problem,
            header.trouble_date,
            header.hm,
            header.title_problem,
            header.part_no,
            header.part_name,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_details(
    conn: &Connection,
    id: i64,
    details: &AnalysisDetails,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE analysis_reports SET component_function = ?1, symptoms = ?2, root_cause = ?3, \
         factor_man = ?4, factor_material = ?5, factor_machine = ?6, factor_method = ?7, \
         factor_environment = ?8, action_taken = ?9, preventive_action = ?10 WHERE id = ?11",
        params![
            details.component_function,
            details.symptoms,
            details.root_cause,
            details.factor_man,
            details.factor_material,
            details.factor_machine,
            details.factor_method,
            details.factor_environment,
            details.action_taken,
            details.preventive_action,
            id,
        ],
    )?;
    Ok(())
}

fn image_columns(slot: DocumentationSlot) -> (&'static str, &'static str) {
    match slot {
        DocumentationSlot::Before => ("documentation_before", "documentation_before_mime"),
        DocumentationSlot::After => ("documentation_after", "documentation_after_mime"),
    }
}

pub fn store_image(
    conn: &Connection,
    id: i64,
    slot: DocumentationSlot,
    image: &StoredImage,
) -> Result<(), AppError> {
    let (blob, mime) = image_columns(slot);
    let sql = format!(
        "UPDATE analysis_reports SET {} = ?1, {} = ?2 WHERE id = ?3",
        blob, mime
    );
    conn.execute(&sql, params![image.bytes, image.mime, id])?;
    Ok(())
}

pub fn load_image(
    conn: &Connection,
    id: i64,
    slot: DocumentationSlot,
) -> Result<Option<StoredImage>, AppError> {
    let (blob, mime) = image_columns(slot);
    let sql = format!(
        "SELECT {}, {} FROM analysis_reports WHERE id = ?1 AND {} IS NOT NULL",
        blob, mime, blob
    );
    Ok(conn
        .query_row(&sql, [id], |row| {
            let mime: Option<String> = row.get(1)?;
            Ok(StoredImage {
                bytes: row.get(0)?,
                mime: mime.unwrap_or_else(|| "application/octet-stream".to_owned()),
            })
        })
        .optional()?)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<AnalysisReport>, AppError> {
    let sql = format!("SELECT {} FROM analysis_reports r WHERE r.id = ?1", REPORT_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_report).optional()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<AnalysisReport, AppError> {
    find_by_id(conn, id)?.ok_or_else(|| AppError::not_found("Analysis report"))
}

/// Reports matching `query`, newest creation first.
pub fn list(conn: &Connection, query: &AnalysisQuery) -> Result<Vec<AnalysisReport>, AppError> {
    let (where_sql, values) = query.where_clause();
    let mut sql = format!(
        "SELECT {} FROM analysis_reports r JOIN users u ON u.id = r.foreman_id {} \
         ORDER BY r.created_at DESC, r.id DESC",
        REPORT_COLUMNS, where_sql
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    let mut stmt = conn.prepare(&sql)?;
    let reports = stmt
        .query_map(params_from_iter(values.iter()), map_report)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reports)
}

pub fn count(conn: &Connection, query: &AnalysisQuery) -> Result<i64, AppError> {
    let (where_sql, values) = query.where_clause();
    let sql = format!(
        "SELECT COUNT(*) FROM analysis_reports r JOIN users u ON u.id = r.foreman_id {}",
        where_sql
    );
    Ok(conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?)
}

/// Analysis reports of a foreman whose report date falls in `(year, month)`.
pub fn count_in_month(
    conn: &Connection,
    foreman_id: i64,
    year: i32,
    month: u32,
) -> Result<i64, AppError> {
    count(
        conn,
        &AnalysisQuery {
            foreman_id: Some(foreman_id),
            month: Some((year, month)),
            ..Default::default()
        },
    )
}

pub fn set_status(
    conn: &Connection,
    id: i64,
    status: ReportStatus,
    feedback: &str,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE analysis_reports SET status = ?1, feedback = ?2 WHERE id = ?3",
        params![status.as_str(), feedback, id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_foreman, insert_user, memory_conn};
    use common::model::choices::{Role, Shift};

    fn header(foreman_id: i64, report_date: NaiveDate) -> AnalysisHeader {
        AnalysisHeader {
            foreman_id,
            section_track: Some("PC1250".into()),
            email: Some("mek@rml.test".into()),
            no_report: Some("AR-01".into()),
            report_date,
            wo_number: Some("WO-77".into()),
            wo_date: report_date,
            unit_code: Some("EX1250".into()),
            problem: Some("1000".into()),
            trouble_date: report_date,
            hm: Some("10500".into()),
            title_problem: "Overheat".into(),
            part_no: None,
            part_name: None,
        }
    }

    #[test]
    fn images_are_optional_per_slot() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let id = insert(&conn, &header(foreman.id, date), now()).unwrap();

        let image = StoredImage {
            bytes: vec![1, 2, 3],
            mime: "image/png".into(),
        };
        store_image(&conn, id, DocumentationSlot::After, &image).unwrap();

        let report = get(&conn, id).unwrap();
        assert!(!report.has_documentation_before);
        assert!(report.has_documentation_after);
        assert_eq!(load_image(&conn, id, DocumentationSlot::After).unwrap(), Some(image));
        assert_eq!(load_image(&conn, id, DocumentationSlot::Before).unwrap(), None);
    }

    #[test]
    fn month_count_uses_report_date() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        for (m, d) in [(5, 1), (5, 31), (6, 1)] {
            let date = NaiveDate::from_ymd_opt(2025, m, d).unwrap();
            insert(&conn, &header(foreman.id, date), now()).unwrap();
        }
        assert_eq!(count_in_month(&conn, foreman.id, 2025, 5).unwrap(), 2);
        assert_eq!(count_in_month(&conn, foreman.id, 2025, 6).unwrap(), 1);
    }

    #[test]
    fn details_update_fills_factors() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let id = insert(&conn, &header(foreman.id, date), now()).unwrap();
        let details = AnalysisDetails {
            root_cause: Some("Radiator tersumbat".into()),
            factor_machine: Some("Fan belt aus".into()),
            ..Default::default()
        };
        update_details(&conn, id, &details).unwrap();
        let report = get(&conn, id).unwrap();
        assert_eq!(report.factors_4m1e(), vec!["Machine (Mesin)"]);
        assert_eq!(report.root_cause.as_deref(), Some("Radiator tersumbat"));
    }

    #[test]
    fn range_and_status_filters_run_against_report_date() {
        let conn = memory_conn();
        let leader = insert_user(&conn, "leader", Role::Leader);
        let foreman = insert_foreman(&conn, "mek", leader.id, Shift::First);
        let other = insert_foreman(&conn, "mek2", leader.id, Shift::Second);
        let seeded = [
            (foreman.id, (4, 30), ReportStatus::Approved),
            (foreman.id, (5, 1), ReportStatus::Approved),
            (foreman.id, (5, 15), ReportStatus::Rejected),
            (other.id, (5, 20), ReportStatus::Approved),
            (foreman.id, (5, 31), ReportStatus::Pending),
            (foreman.id, (6, 1), ReportStatus::Approved),
        ];
        for (owner, (m, d), status) in seeded {
            let date = NaiveDate::from_ymd_opt(2025, m, d).unwrap();
            let id = insert(&conn, &header(owner, date), now()).unwrap();
            set_status(&conn, id, status, "").unwrap();
        }

        let may = AnalysisQuery {
            date_from: NaiveDate::from_ymd_opt(2025, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 5, 31),
            ..Default::default()
        };
        assert_eq!(count(&conn, &may).unwrap(), 4);
        assert_eq!(list(&conn, &may).unwrap().len(), 4);

        let approved_in_may = AnalysisQuery {
            status: Some(ReportStatus::Approved),
            ..may.clone()
        };
        let rows = list(&conn, &approved_in_may).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.status == ReportStatus::Approved));
        assert_eq!(count(&conn, &approved_in_may).unwrap(), 2);

        let mine = AnalysisQuery {
            foreman_id: Some(foreman.id),
            ..approved_in_may
        };
        let rows = list(&conn, &mine).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].report_date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());

        let open_ended = AnalysisQuery {
            date_from: NaiveDate::from_ymd_opt(2025, 5, 31),
            ..Default::default()
        };
        assert_eq!(count(&conn, &open_ended).unwrap(), 2);
    }
}
