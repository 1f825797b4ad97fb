//! Query-string filters of the report lists and exports.
//!
//! Unparseable values are ignored rather than rejected, so a stale bookmark
//! still shows a page.

use crate::store::activity::ActivityQuery;
use crate::store::analysis::AnalysisQuery;
use crate::web::form::{parse_date, parse_month};
use chrono::NaiveDate;
use common::model::choices::ReportStatus;
use common::requests::ReportFilter;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn start_date(filter: &ReportFilter) -> Option<NaiveDate> {
    non_empty(&filter.start_date).and_then(parse_date)
}

pub fn end_date(filter: &ReportFilter) -> Option<NaiveDate> {
    non_empty(&filter.end_date).and_then(parse_date)
}

pub fn status(filter: &ReportFilter) -> Option<ReportStatus> {
    non_empty(&filter.status).and_then(|s| s.parse().ok())
}

pub fn foreman(filter: &ReportFilter) -> Option<i64> {
    non_empty(&filter.foreman).and_then(|s| s.parse().ok())
}

pub fn day(filter: &ReportFilter) -> Option<NaiveDate> {
    non_empty(&filter.date).and_then(parse_date)
}

pub fn month(filter: &ReportFilter) -> Option<(i32, u32)> {
    non_empty(&filter.month).and_then(parse_month)
}

/// Requested page number; anything that is not a positive integer reads as
/// no request.
pub fn page(filter: &ReportFilter) -> Option<u32> {
    non_empty(&filter.page).and_then(|s| s.parse().ok())
}

/// Export filter over activity reports, newest date first.
pub fn activity_query(filter: &ReportFilter) -> ActivityQuery {
    ActivityQuery {
        foreman_id: foreman(filter),
        status: status(filter),
        date_from: start_date(filter),
        date_to: end_date(filter),
        ..Default::default()
    }
}

/// Export filter over analysis reports.
pub fn analysis_query(filter: &ReportFilter) -> AnalysisQuery {
    AnalysisQuery {
        foreman_id: foreman(filter),
        status: status(filter),
        date_from: start_date(filter),
        date_to: end_date(filter),
        ..Default::default()
    }
}

/// "a s/d b", "Mulai a" or "Sampai b" for the export header.
pub fn date_range_label(filter: &ReportFilter) -> Option<String> {
    match (non_empty(&filter.start_date), non_empty(&filter.end_date)) {
        (Some(start), Some(end)) => Some(format!("{} s/d {}", start, end)),
        (Some(start), None) => Some(format!("Mulai {}", start)),
        (None, Some(end)) => Some(format!("Sampai {}", end)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filter(start: &str, end: &str, status: &str, foreman: &str) -> ReportFilter {
        let opt = |s: &str| Some(s.to_owned());
        ReportFilter {
            start_date: opt(start),
            end_date: opt(end),
            status: opt(status),
            foreman: opt(foreman),
            ..Default::default()
        }
    }

    #[test]
    fn blank_fields_do_not_filter() {
        let query = activity_query(&filter("", " ", "", ""));
        assert!(query.date_from.is_none() && query.date_to.is_none());
        assert!(query.status.is_none() && query.foreman_id.is_none());
    }

    #[test]
    fn filled_fields_restrict() {
        let query = analysis_query(&filter("2025-05-01", "2025-05-31", "approved", "7"));
        assert_eq!(query.date_from, NaiveDate::from_ymd_opt(2025, 5, 1));
        assert_eq!(query.date_to, NaiveDate::from_ymd_opt(2025, 5, 31));
        assert_eq!(query.status, Some(ReportStatus::Approved));
        assert_eq!(query.foreman_id, Some(7));
    }

    #[test]
    fn garbage_is_ignored() {
        let query = activity_query(&filter("31/05/2025", "x", "done", "abc"));
        assert!(query.date_from.is_none());
        assert!(query.status.is_none());
        assert!(query.foreman_id.is_none());
    }

    #[rstest]
    #[case("3", Some(3))]
    #[case(" 2 ", Some(2))]
    #[case("abc", None)]
    #[case("-1", None)]
    #[case("", None)]
    fn page_number_parses_leniently(#[case] raw: &str, #[case] expected: Option<u32>) {
        let filter = ReportFilter {
            page: Some(raw.to_owned()),
            ..Default::default()
        };
        assert_eq!(page(&filter), expected);
    }

    #[rstest]
    #[case("2025-05-01", "2025-05-31", Some("2025-05-01 s/d 2025-05-31"))]
    #[case("2025-05-01", "", Some("Mulai 2025-05-01"))]
    #[case("", "2025-05-31", Some("Sampai 2025-05-31"))]
    #[case("", "", None)]
    fn range_label(#[case] start: &str, #[case] end: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            date_range_label(&filter(start, end, "", "")).as_deref(),
            expected
        );
    }
}
