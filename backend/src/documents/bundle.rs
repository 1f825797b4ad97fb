//! Packaging of several analysis report PDFs into one download.

use super::tar::{render_tar, Documentation};
use super::{Attachment, PdfSettings};
use crate::error::AppError;
use crate::store::analysis;
use crate::web::views::AnalysisView;
use chrono::NaiveDate;
use common::model::analysis::DocumentationSlot;
use rusqlite::Connection;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn bundle_filename(day: NaiveDate) -> String {
    format!("Technical_Analysis_Reports_{}.zip", day.format("%Y%m%d"))
}

/// No files gives `None`, a single file is returned as is, anything more is
/// zipped. Duplicate names get a numeric suffix.
pub fn bundle(files: Vec<Attachment>, day: NaiveDate) -> Result<Option<Attachment>, AppError> {
    if files.len() <= 1 {
        return Ok(files.into_iter().next());
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used: Vec<String> = Vec::with_capacity(files.len());
    for file in &files {
        let name = unique_name(&used, &file.filename);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&file.bytes)?;
        used.push(name);
    }
    let cursor = zip.finish()?;

    Ok(Some(Attachment {
        filename: bundle_filename(day),
        content_type: "application/zip",
        bytes: cursor.into_inner(),
    }))
}

fn unique_name(used: &[String], name: &str) -> String {
    if !used.iter().any(|n| n == name) {
        return name.to_owned();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{}", ext)),
        None => (name, String::new()),
    };
    (2..)
        .map(|n| format!("{}_{}{}", stem, n, ext))
        .find(|candidate| !used.iter().any(|u| u == candidate))
        .unwrap_or_else(|| name.to_owned())
}

pub fn load_documentation(conn: &Connection, report_id: i64) -> Result<Documentation, AppError> {
    Ok(Documentation {
        before: analysis::load_image(conn, report_id, DocumentationSlot::Before)?,
        after: analysis::load_image(conn, report_id, DocumentationSlot::After)?,
    })
}

/// Renders every report and packages the result.
pub fn export_analysis_reports(
    conn: &Connection,
    settings: &PdfSettings,
    views: &[AnalysisView],
    day: NaiveDate,
) -> Result<Option<Attachment>, AppError> {
    let mut files = Vec::with_capacity(views.len());
    for view in views {
        let documentation = load_documentation(conn, view.report.id)?;
        files.push(render_tar(settings, view, &documentation)?);
    }
    bundle(files, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn pdf(name: &str) -> Attachment {
        Attachment {
            filename: name.to_owned(),
            content_type: "application/pdf",
            bytes: format!("%PDF {}", name).into_bytes(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn nothing_to_bundle() {
        assert!(bundle(Vec::new(), day()).unwrap().is_none());
    }

    #[test]
    fn single_report_is_not_zipped() {
        let out = bundle(vec![pdf("TAR_1_20250601.pdf")], day()).unwrap().unwrap();
        assert_eq!(out.filename, "TAR_1_20250601.pdf");
        assert_eq!(out.content_type, "application/pdf");
    }

    #[test]
    fn several_reports_become_a_zip() {
        let out = bundle(
            vec![
                pdf("TAR_A_20250601.pdf"),
                pdf("TAR_B_20250601.pdf"),
                pdf("TAR_A_20250601.pdf"),
            ],
            day(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out.filename, "Technical_Analysis_Reports_20250602.zip");
        assert_eq!(out.content_type, "application/zip");

        let mut archive = ZipArchive::new(Cursor::new(out.bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"TAR_A_20250601_2.pdf".to_owned()));

        let mut body = String::new();
        archive
            .by_name("TAR_B_20250601.pdf")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "%PDF TAR_B_20250601.pdf");
    }
}
