use crate::model::choices::{label_of, ReportStatus, PROBLEMS};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Technical analysis report (TAR) filed by a foreman.
///
/// The 4M1E factors are free text; a factor counts as identified when its
/// text is non-empty. Documentation images are stored inline and are not
/// part of this struct, only their presence is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: i64,
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
    pub status: ReportStatus,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
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
    pub has_documentation_before: bool,
    pub has_documentation_after: bool,
}

/// Which documentation image of an analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationSlot {
    Before,
    After,
}

impl DocumentationSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentationSlot::Before => "before",
            DocumentationSlot::After => "after",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "before" | "sebelum" => Some(DocumentationSlot::Before),
            "after" | "sesudah" => Some(DocumentationSlot::After),
            _ => None,
        }
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl AnalysisReport {
    /// Labels of the 4M1E factors that carry an explanation.
    pub fn factors_4m1e(&self) -> Vec<&'static str> {
        [
            (&self.factor_man, "Man (Manusia)"),
            (&self.factor_material, "Material"),
            (&self.factor_machine, "Machine (Mesin)"),
            (&self.factor_method, "Method (Metode)"),
            (&self.factor_environment, "Environment (Lingkungan)"),
        ]
        .into_iter()
        .filter(|(value, _)| filled(value))
        .map(|(_, label)| label)
        .collect()
    }

    pub fn problem_label(&self) -> Option<&'static str> {
        self.problem.as_deref().and_then(|p| label_of(PROBLEMS, p))
    }

    /// Title shortened for dashboard tables.
    pub fn short_title(&self, max_chars: usize) -> String {
        if self.title_problem.chars().count() > max_chars {
            let cut: String = self.title_problem.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            self.title_problem.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> AnalysisReport {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        AnalysisReport {
            id: 1,
            foreman_id: 2,
            section_track: Some("PC1250".into()),
            email: None,
            no_report: Some("AR1001".into()),
            report_date: day,
            wo_number: None,
            wo_date: day,
            unit_code: None,
            problem: Some("1000".into()),
            trouble_date: day,
            hm: None,
            title_problem: "Engine overheating pada unit excavator".into(),
            part_no: None,
            part_name: None,
            status: ReportStatus::Pending,
            feedback: None,
            created_at: day.and_hms_opt(9, 0, 0).unwrap(),
            component_function: None,
            symptoms: None,
            root_cause: None,
            factor_man: Some("Kelalaian operator".into()),
            factor_material: Some("   ".into()),
            factor_machine: None,
            factor_method: Some("SOP tidak sesuai".into()),
            factor_environment: None,
            action_taken: None,
            preventive_action: None,
            has_documentation_before: false,
            has_documentation_after: false,
        }
    }

    #[test]
    fn factors_skip_blank_explanations() {
        assert_eq!(report().factors_4m1e(), vec!["Man (Manusia)", "Method (Metode)"]);
    }

    #[test]
    fn short_title_truncates_on_char_boundary() {
        assert_eq!(report().short_title(6), "Engine...");
        assert_eq!(report().short_title(200), report().title_problem);
    }

    #[test]
    fn problem_label_resolves_code() {
        assert_eq!(report().problem_label(), Some("Engine"));
    }
}
