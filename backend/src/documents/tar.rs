//! Technical Analysis Report (TAR) PDF.

use super::{bold, configure_document, embed_image, or_dash, render, Attachment, PdfSettings};
use crate::error::AppError;
use crate::store::analysis::StoredImage;
use crate::web::views::AnalysisView;
use chrono::NaiveDate;
use common::model::analysis::AnalysisReport;
use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Element};
use tempfile::NamedTempFile;

const DOCUMENTATION_MAX_PX: f64 = 450.0;

/// Documentation photos loaded for one report.
#[derive(Debug, Default)]
pub struct Documentation {
    pub before: Option<StoredImage>,
    pub after: Option<StoredImage>,
}

/// Titled analysis paragraphs; blank fields are left out.
pub fn analysis_sections(report: &AnalysisReport) -> Vec<(&'static str, String)> {
    [
        ("NAMA DAN FUNGSI KOMPONEN", &report.component_function),
        ("GEJALA MASALAH YANG DIHADAPI", &report.symptoms),
        ("AKAR PENYEBAB MASALAH", &report.root_cause),
        ("TINDAKAN YANG DILAKUKAN", &report.action_taken),
        ("TINDAKAN PENCEGAHAN", &report.preventive_action),
    ]
    .into_iter()
    .filter_map(|(title, value)| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (title, v.to_owned()))
    })
    .collect()
}

/// 4M1E factor rows with their explanation; blank factors are left out.
pub fn factor_rows(report: &AnalysisReport) -> Vec<(&'static str, String)> {
    [
        ("MAN", &report.factor_man),
        ("MATERIAL", &report.factor_material),
        ("MACHINE", &report.factor_machine),
        ("METHOD", &report.factor_method),
        ("ENVIRONMENT", &report.factor_environment),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (label, v.to_owned()))
    })
    .collect()
}

/// `TAR_{report number or id}_{report date}.pdf`.
pub fn tar_filename(report: &AnalysisReport) -> String {
    let number = report
        .no_report
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.replace(['/', '\\', ' '], "-"))
        .unwrap_or_else(|| report.id.to_string());
    format!("TAR_{}_{}.pdf", number, report.report_date.format("%Y%m%d"))
}

fn grid(weights: Vec<usize>) -> TableLayout {
    let mut table = TableLayout::new(weights);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
}

fn cell(text: impl Into<String>) -> impl Element {
    Paragraph::new(text.into()).padded(1)
}

fn head(text: &str) -> impl Element {
    Paragraph::new(text)
        .aligned(Alignment::Center)
        .styled(Style::new().bold().with_font_size(8))
        .padded(1)
}

fn date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

fn push_tables(doc: &mut genpdf::Document, settings: &PdfSettings, view: &AnalysisView) -> Result<(), AppError> {
    let report = &view.report;

    let mut header = grid(vec![1, 1]);
    header
        .row()
        .element(
            LinearLayout::vertical()
                .element(bold(settings.company_name.clone()))
                .element(Paragraph::new("Mechanic Development"))
                .padded(2),
        )
        .element(
            Paragraph::new("TECHNICAL ANALYSIS REPORT (TAR)")
                .aligned(Alignment::Center)
                .styled(Style::new().bold().with_font_size(13))
                .padded(2),
        )
        .push()?;
    doc.push(header);
    doc.push(Break::new(1));

    let mut basic = grid(vec![2, 3, 2, 3]);
    basic
        .row()
        .element(cell("REPORT NO :"))
        .element(cell(or_dash(report.no_report.as_deref())))
        .element(cell("WO NUMBER"))
        .element(cell(or_dash(report.wo_number.as_deref())))
        .push()?;
    basic
        .row()
        .element(cell("REPORT DATE :"))
        .element(cell(date(report.report_date)))
        .element(cell("WO DATE"))
        .element(cell(date(report.wo_date)))
        .push()?;
    doc.push(basic);
    doc.push(Break::new(0.5));

    let mut machine = grid(vec![1, 1, 1]);
    machine
        .row()
        .element(head("CODE NUMBER"))
        .element(head("SECTION"))
        .element(head("E-MAIL"))
        .push()?;
    machine
        .row()
        .element(cell(or_dash(report.unit_code.as_deref())))
        .element(cell(or_dash(report.section_track.as_deref())))
        .element(cell(or_dash(report.email.as_deref())))
        .push()?;
    doc.push(machine);
    doc.push(Break::new(0.5));

    let problem = report
        .problem
        .as_deref()
        .map(|code| match report.problem_label() {
            Some(label) => format!("{} - {}", code, label),
            None => code.to_owned(),
        });
    let mut problem_table = grid(vec![2, 4, 2, 2, 1, 2]);
    problem_table
        .row()
        .element(cell("PROBLEM"))
        .element(cell(or_dash(problem.as_deref())))
        .element(cell("TROUBLE DATE"))
        .element(cell(date(report.trouble_date)))
        .element(cell("HM"))
        .element(cell(or_dash(report.hm.as_deref())))
        .push()?;
    doc.push(problem_table);
    doc.push(Break::new(0.5));

    let mut title_table = grid(vec![1, 4]);
    title_table
        .row()
        .element(cell("TITLE PROBLEM"))
        .element(bold(report.title_problem.clone()).padded(1))
        .push()?;
    doc.push(title_table);
    doc.push(Break::new(0.5));

    let mut part = grid(vec![1, 1]);
    part.row()
        .element(head("PART NUMBER"))
        .element(head("PART NAME"))
        .push()?;
    part.row()
        .element(cell(or_dash(report.part_no.as_deref())))
        .element(cell(or_dash(report.part_name.as_deref())))
        .push()?;
    doc.push(part);
    Ok(())
}

fn push_analysis(doc: &mut genpdf::Document, report: &AnalysisReport) -> Result<(), AppError> {
    let sections = analysis_sections(report);
    let factors = factor_rows(report);
    if sections.is_empty() && factors.is_empty() {
        return Ok(());
    }
    doc.push(Break::new(1));
    doc.push(
        Paragraph::new("DESCRIBE AND ANALYZE THE PROBLEM")
            .styled(Style::new().bold().with_font_size(11)),
    );
    for (heading, text) in sections {
        doc.push(Break::new(0.5));
        doc.push(bold(heading));
        let mut boxed = grid(vec![1]);
        boxed.row().element(cell(text)).push()?;
        doc.push(boxed);
    }
    if !factors.is_empty() {
        doc.push(Break::new(0.5));
        doc.push(bold("FAKTOR 4M1E"));
        let mut table = grid(vec![1, 4]);
        for (label, text) in factors {
            table.row().element(cell(label)).element(cell(text)).push()?;
        }
        doc.push(table);
    }
    Ok(())
}

fn push_documentation(
    doc: &mut genpdf::Document,
    images: &Documentation,
    temp_files: &mut Vec<NamedTempFile>,
) -> Result<(), AppError> {
    let slots = [("SEBELUM", &images.before), ("SESUDAH", &images.after)];
    if slots.iter().all(|(_, img)| img.is_none()) {
        return Ok(());
    }
    doc.push(Break::new(1));
    doc.push(bold("DOKUMENTASI"));
    for (label, image) in slots {
        if let Some(image) = image {
            doc.push(Break::new(0.5));
            doc.push(Paragraph::new(label).aligned(Alignment::Center));
            doc.push(embed_image(&image.bytes, DOCUMENTATION_MAX_PX, temp_files)?);
        }
    }
    Ok(())
}

fn push_signature(doc: &mut genpdf::Document, view: &AnalysisView) -> Result<(), AppError> {
    doc.push(Break::new(1));
    let mut table = grid(vec![3, 4, 3, 4]);
    table
        .row()
        .element(cell("MECHANIC NAME"))
        .element(cell(view.foreman_name.clone()))
        .element(cell("SUPERVISOR NAME"))
        .element(cell(view.leader_name.clone()))
        .push()?;
    table
        .row()
        .element(cell("SIGN").padded(3))
        .element(cell(""))
        .element(cell("SIGN").padded(3))
        .element(cell(""))
        .push()?;
    doc.push(table);
    Ok(())
}

/// Renders the TAR form of one report.
pub fn render_tar(
    settings: &PdfSettings,
    view: &AnalysisView,
    images: &Documentation,
) -> Result<Attachment, AppError> {
    let mut doc = configure_document(settings, "Technical Analysis Report")?;
    let mut temp_files: Vec<NamedTempFile> = Vec::new();

    push_tables(&mut doc, settings, view)?;
    push_analysis(&mut doc, &view.report)?;
    push_documentation(&mut doc, images, &mut temp_files)?;
    push_signature(&mut doc, view)?;

    let bytes = render(doc)?;
    Ok(Attachment {
        filename: tar_filename(&view.report),
        content_type: "application/pdf",
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use common::model::choices::ReportStatus;

    fn report() -> AnalysisReport {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        AnalysisReport {
            id: 42,
            foreman_id: 1,
            section_track: Some("HD785".into()),
            email: None,
            no_report: None,
            report_date: day,
            wo_number: None,
            wo_date: day,
            unit_code: None,
            problem: Some("1000".into()),
            trouble_date: day,
            hm: None,
            title_problem: "Overheat".into(),
            part_no: None,
            part_name: None,
            status: ReportStatus::Pending,
            feedback: None,
            created_at: NaiveDateTime::default(),
            component_function: Some("Radiator".into()),
            symptoms: Some("   ".into()),
            root_cause: None,
            factor_man: None,
            factor_material: Some("Coolant palsu".into()),
            factor_machine: None,
            factor_method: None,
            factor_environment: Some("Debu".into()),
            action_taken: Some("Flushing".into()),
            preventive_action: None,
            has_documentation_before: false,
            has_documentation_after: false,
        }
    }

    #[test]
    fn only_filled_sections_are_printed() {
        let sections = analysis_sections(&report());
        let titles: Vec<_> = sections.iter().map(|(t, _)| *t).collect();
        assert_eq!(titles, vec!["NAMA DAN FUNGSI KOMPONEN", "TINDAKAN YANG DILAKUKAN"]);
        let factors: Vec<_> = factor_rows(&report()).into_iter().map(|(l, _)| l).collect();
        assert_eq!(factors, vec!["MATERIAL", "ENVIRONMENT"]);
    }

    #[test]
    fn filename_prefers_report_number() {
        let mut r = report();
        assert_eq!(tar_filename(&r), "TAR_42_20250310.pdf");
        r.no_report = Some("AR/03 01".into());
        assert_eq!(tar_filename(&r), "TAR_AR-03-01_20250310.pdf");
    }
}
