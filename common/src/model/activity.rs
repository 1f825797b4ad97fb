use crate::model::choices::{label_of, ActivityCode, ReportStatus, Shift, COMPONENTS};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Upper bound on activity rows per daily report; the paper form has five lines.
pub const MAX_DETAILS: usize = 5;

/// Daily activity report header of one foreman.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub id: i64,
    pub foreman_id: i64,
    pub date: NaiveDate,
    pub shift: Shift,
    pub nrp: Option<String>,
    pub section: Option<String>,
    pub status: ReportStatus,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
    pub details: Vec<ActivityReportDetail>,
}

impl ActivityReport {
    /// Sum of the row durations in hours.
    pub fn total_hours(&self) -> f64 {
        self.details.iter().map(ActivityReportDetail::duration_hours).sum()
    }
}

/// One numbered line of an activity report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReportDetail {
    pub id: i64,
    pub activity_report_id: i64,
    pub activity_number: i64,
    pub unit_code: String,
    pub hm_km: Option<String>,
    pub start_time: NaiveTime,
    pub stop_time: NaiveTime,
    pub component: Option<String>,
    pub activities: String,
    pub activity_code: Option<ActivityCode>,
}

impl ActivityReportDetail {
    /// Hours between start and stop. A stop earlier than the start is a
    /// night-shift row that ends after midnight.
    pub fn duration_hours(&self) -> f64 {
        let mut minutes = (self.stop_time - self.start_time).num_minutes();
        if minutes < 0 {
            minutes += 24 * 60;
        }
        minutes as f64 / 60.0
    }

    pub fn component_label(&self) -> Option<&'static str> {
        self.component
            .as_deref()
            .and_then(|code| label_of(COMPONENTS, code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn detail(start: (u32, u32), stop: (u32, u32)) -> ActivityReportDetail {
        ActivityReportDetail {
            id: 1,
            activity_report_id: 1,
            activity_number: 1,
            unit_code: "UN101".into(),
            hm_km: None,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            stop_time: NaiveTime::from_hms_opt(stop.0, stop.1, 0).unwrap(),
            component: Some("Component_1".into()),
            activities: "Ganti oli".into(),
            activity_code: Some(ActivityCode::Sc),
        }
    }

    #[rstest]
    #[case((7, 0), (9, 30), 2.5)]
    #[case((22, 0), (2, 0), 4.0)]
    #[case((8, 0), (8, 0), 0.0)]
    fn duration_wraps_past_midnight(
        #[case] start: (u32, u32),
        #[case] stop: (u32, u32),
        #[case] hours: f64,
    ) {
        assert!((detail(start, stop).duration_hours() - hours).abs() < f64::EPSILON);
    }

    #[test]
    fn component_label_uses_choice_table() {
        assert_eq!(detail((7, 0), (8, 0)).component_label(), Some("Engine"));
    }
}
