//! "FORMULIR MECHANIC ACTIVITY REPORT": one printed form per report with a
//! fixed five-row activity table.

use super::{bold, configure_document, render, title, Attachment, PdfSettings};
use crate::error::AppError;
use crate::web::views::ActivityView;
use chrono::NaiveDate;
use common::model::activity::MAX_DETAILS;
use genpdf::elements::{Break, FrameCellDecorator, PageBreak, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Element};
use log::info;

pub const TABLE_HEADERS: [&str; 9] = [
    "NO",
    "START",
    "STOP",
    "DURASI (JAM)",
    "ACTIVITIES",
    "UNIT CODE",
    "HM/KM",
    "SC/US",
    "COMPONENT",
];

const ACTIVITY_TEXT_LIMIT: usize = 30;

fn shorten(text: &str) -> String {
    if text.chars().count() > ACTIVITY_TEXT_LIMIT {
        let head: String = text.chars().take(ACTIVITY_TEXT_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.to_owned()
    }
}

/// The five table rows of a form; unused rows carry only their number.
pub fn table_rows(view: &ActivityView) -> Vec<[String; 9]> {
    (1..=MAX_DETAILS)
        .map(|no| {
            let Some(row) = view
                .rows
                .iter()
                .find(|r| r.detail.activity_number == no as i64)
            else {
                let mut empty: [String; 9] = Default::default();
                empty[0] = no.to_string();
                return empty;
            };
            let d = &row.detail;
            [
                no.to_string(),
                d.start_time.format("%H:%M").to_string(),
                d.stop_time.format("%H:%M").to_string(),
                format!("{:.1}", row.duration),
                shorten(&d.activities),
                d.unit_code.clone(),
                d.hm_km.clone().unwrap_or_default(),
                row.activity_code_label.unwrap_or_default().to_owned(),
                row.component_label.unwrap_or_default().to_owned(),
            ]
        })
        .collect()
}

fn header_table(settings: &PdfSettings) -> Result<TableLayout, AppError> {
    let mut table = TableLayout::new(vec![1, 2]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
        .row()
        .element(
            Paragraph::new("Mining Contractor")
                .aligned(Alignment::Center)
                .padded(2),
        )
        .element(
            Paragraph::new(settings.company_name.as_str())
                .aligned(Alignment::Center)
                .styled(Style::new().bold().with_font_size(12))
                .padded(2),
        )
        .push()?;
    Ok(table)
}

fn identity_table(view: &ActivityView, section: &str) -> Result<TableLayout, AppError> {
    let mut table = TableLayout::new(vec![2, 1, 4, 2, 1, 4]);
    let date = view.date.format("%d/%m/%Y").to_string();
    let rows = [
        ["Nama", view.foreman_name.as_str(), "Date", date.as_str()],
        ["NRP", view.nrp.as_deref().unwrap_or(""), "CC Atasan", view.leader_name.as_str()],
        ["", "", "Section", section],
    ];
    for [left_label, left_value, right_label, right_value] in rows {
        let colon = |label: &str| if label.is_empty() { "" } else { ":" };
        table
            .row()
            .element(Paragraph::new(left_label))
            .element(Paragraph::new(colon(left_label)))
            .element(Paragraph::new(left_value))
            .element(Paragraph::new(right_label))
            .element(Paragraph::new(colon(right_label)))
            .element(Paragraph::new(right_value))
            .push()?;
    }
    Ok(table)
}

fn activity_table(view: &ActivityView) -> Result<TableLayout, AppError> {
    let mut table = TableLayout::new(vec![2, 3, 3, 3, 9, 3, 3, 3, 4]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    let mut header = table.row();
    for name in TABLE_HEADERS {
        header = header.element(
            Paragraph::new(name)
                .aligned(Alignment::Center)
                .styled(Style::new().bold().with_font_size(8))
                .padded(1),
        );
    }
    header.push()?;
    for cells in table_rows(view) {
        let mut row = table.row();
        for cell in cells {
            row = row.element(
                Paragraph::new(cell)
                    .aligned(Alignment::Center)
                    .styled(Style::new().with_font_size(8))
                    .padded(1),
            );
        }
        row.push()?;
    }
    Ok(table)
}

fn signature_table(view: &ActivityView) -> Result<TableLayout, AppError> {
    let mut table = TableLayout::new(vec![1, 1]);
    table
        .row()
        .element(Paragraph::new("Group Leader").aligned(Alignment::Center))
        .element(Paragraph::new("Mekanik").aligned(Alignment::Center))
        .push()?;
    table
        .row()
        .element(Break::new(4))
        .element(Break::new(4))
        .push()?;
    table
        .row()
        .element(Paragraph::new(format!("({})", view.leader_name)).aligned(Alignment::Center))
        .element(Paragraph::new(format!("({})", view.foreman_name)).aligned(Alignment::Center))
        .push()?;
    Ok(table)
}

/// Renders one form per report into a single PDF.
pub fn render_activity_reports(
    settings: &PdfSettings,
    reports: &[ActivityView],
    department_of: impl Fn(&ActivityView) -> Option<String>,
    printed_on: NaiveDate,
) -> Result<Attachment, AppError> {
    let mut doc = configure_document(settings, "Mechanic Activity Report")?;
    for (index, view) in reports.iter().enumerate() {
        if index > 0 {
            doc.push(PageBreak::new());
        }
        doc.push(header_table(settings)?);
        doc.push(Break::new(1));
        doc.push(title("FORMULIR MECHANIC ACTIVITY REPORT", 12));
        doc.push(Break::new(1));
        let section = view
            .section
            .clone()
            .or_else(|| department_of(view))
            .unwrap_or_default();
        doc.push(identity_table(view, &section)?);
        doc.push(Break::new(1));
        doc.push(activity_table(view)?);
        doc.push(Break::new(1));
        doc.push(bold(format!("Total Durasi (Jam) : {:.1}", view.total_hours)));
        doc.push(Break::new(1));
        doc.push(
            Paragraph::new(format!(
                "{}, ({})",
                settings.site_name,
                printed_on.format("%d/%m/%Y")
            ))
            .aligned(Alignment::Right),
        );
        doc.push(Break::new(2));
        doc.push(signature_table(view)?);
    }
    if reports.is_empty() {
        doc.push(Paragraph::new("Tidak ada laporan."));
    }
    let bytes = render(doc)?;
    info!("Rendered activity report PDF with {} forms", reports.len());
    Ok(Attachment {
        filename: format!("Mechanic_Activity_Report_{}.pdf", printed_on.format("%Y%m%d")),
        content_type: "application/pdf",
        bytes,
    })
}
