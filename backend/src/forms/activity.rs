//! Daily activity report form.
//!
//! The page posts a header plus up to five numbered rows (`unit_code_1`,
//! `start_time_1`, ...). A row with every field blank is skipped; a row
//! that is partly filled must carry a unit code, a start and a stop time.

use crate::error::AppError;
use crate::reminders::remove_completed_notifications;
use crate::store::activity::{self, NewActivityReport, NewDetail};
use crate::web::form::{parse_time, FormData};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::model::activity::MAX_DETAILS;
use common::model::choices::{label_of, ActivityCode, Shift, COMPONENTS};
use common::model::notification::NotificationType;
use common::model::user::User;
use log::info;
use rusqlite::Connection;

const ROW_FIELDS: [&str; 7] = [
    "unit_code",
    "hm_km",
    "start_time",
    "stop_time",
    "component",
    "activities",
    "activity_code",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowInput {
    pub number: usize,
    pub unit_code: String,
    pub hm_km: String,
    pub start_time: String,
    pub stop_time: String,
    pub component: String,
    pub activities: String,
    pub activity_code: String,
}

impl RowInput {
    fn is_blank(&self) -> bool {
        [
            &self.unit_code,
            &self.hm_km,
            &self.start_time,
            &self.stop_time,
            &self.component,
            &self.activities,
            &self.activity_code,
        ]
        .iter()
        .all(|v| v.is_empty())
    }

    fn validate(&self, errors: &mut Vec<String>) -> Option<NewDetail> {
        let before = errors.len();
        let prefix = format!("Aktivitas {}", self.number);
        if self.unit_code.is_empty() {
            errors.push(format!("{}: Unit code wajib diisi.", prefix));
        }
        let start = self.time(&self.start_time, &prefix, "Waktu mulai", errors);
        let stop = self.time(&self.stop_time, &prefix, "Waktu selesai", errors);
        let component = (!self.component.is_empty()).then(|| self.component.clone());
        if let Some(code) = &component {
            if label_of(COMPONENTS, code).is_none() {
                errors.push(format!("{}: Component tidak dikenal.", prefix));
            }
        }
        let activity_code = if self.activity_code.is_empty() {
            None
        } else {
            match self.activity_code.parse::<ActivityCode>() {
                Ok(code) => Some(code),
                Err(_) => {
                    errors.push(format!("{}: Activity code tidak dikenal.", prefix));
                    None
                }
            }
        };
        if errors.len() > before {
            return None;
        }
        Some(NewDetail {
            activity_number: self.number as i64,
            unit_code: self.unit_code.clone(),
            hm_km: (!self.hm_km.is_empty()).then(|| self.hm_km.clone()),
            start_time: start?,
            stop_time: stop?,
            component,
            activities: self.activities.clone(),
            activity_code,
        })
    }

    fn time(
        &self,
        raw: &str,
        prefix: &str,
        label: &str,
        errors: &mut Vec<String>,
    ) -> Option<NaiveTime> {
        if raw.is_empty() {
            errors.push(format!("{}: {} wajib diisi.", prefix, label));
            return None;
        }
        let parsed = parse_time(raw);
        if parsed.is_none() {
            errors.push(format!("{}: {} tidak valid.", prefix, label));
        }
        parsed
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivityForm {
    pub date: String,
    pub shift: String,
    pub section: String,
    pub rows: Vec<RowInput>,
}

impl ActivityForm {
    pub fn parse(form: &FormData) -> Self {
        let rows = (1..=MAX_DETAILS)
            .map(|number| {
                let field = |name: &str| form.text(&format!("{}_{}", name, number));
                RowInput {
                    number,
                    unit_code: field(ROW_FIELDS[0]),
                    hm_km: field(ROW_FIELDS[1]),
                    start_time: field(ROW_FIELDS[2]),
                    stop_time: field(ROW_FIELDS[3]),
                    component: field(ROW_FIELDS[4]),
                    activities: field(ROW_FIELDS[5]),
                    activity_code: field(ROW_FIELDS[6]),
                }
            })
            .collect();
        Self {
            date: form.text("date"),
            shift: form.text("shift"),
            section: form.text("section"),
            rows,
        }
    }

    /// Builds the report for `foreman`. NRP is copied from the account and
    /// the section defaults to the foreman's department.
    pub fn validate(&self, foreman: &User) -> Result<NewActivityReport, AppError> {
        let mut errors = Vec::new();
        let date = match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push("Tanggal wajib diisi dengan format yang benar.".to_owned());
                None
            }
        };
        let shift = match self.shift.parse::<i64>().ok().map(Shift::from_i64) {
            Some(Ok(shift)) if shift != Shift::Off => Some(shift),
            _ => {
                errors.push("Shift tidak valid.".to_owned());
                None
            }
        };
        let mut details = Vec::new();
        for row in self.rows.iter().filter(|r| !r.is_blank()) {
            if let Some(detail) = row.validate(&mut errors) {
                details.push(detail);
            }
        }
        if self.rows.iter().all(RowInput::is_blank) {
            errors.push("Minimal satu aktivitas harus diisi.".to_owned());
        }
        let (Some(date), Some(shift)) = (date, shift) else {
            return Err(AppError::Validation(errors));
        };
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let section = if self.section.is_empty() {
            foreman.department.map(|d| d.as_str().to_owned())
        } else {
            Some(self.section.clone())
        };
        Ok(NewActivityReport {
            foreman_id: foreman.id,
            date,
            shift,
            nrp: foreman.nrp.clone(),
            section,
            details,
        })
    }
}

/// Saves a new report and clears the foreman's completed activity reminders.
pub fn submit_activity_report(
    conn: &Connection,
    foreman: &User,
    form: &ActivityForm,
    now: NaiveDateTime,
) -> Result<i64, AppError> {
    let report = form.validate(foreman)?;
    if activity::exists_for(conn, foreman.id, report.date)? {
        return Err(AppError::validation(format!(
            "Laporan aktivitas untuk tanggal {} sudah ada.",
            report.date.format("%d/%m/%Y")
        )));
    }
    let id = activity::insert(conn, &report, now)?;
    remove_completed_notifications(conn, foreman.id, NotificationType::ActivityReminder)?;
    info!(
        "Activity report {} by {} with {} rows",
        id,
        foreman.username,
        report.details.len()
    );
    Ok(id)
}
