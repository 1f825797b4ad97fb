//! Two-step technical analysis report (TAR) form.
//!
//! Step 1 stores the header and redirects to step 2, where the foreman adds
//! the analysis texts and the before/after documentation photos.

use crate::config::{MAX_IMAGE_BYTES, REQUIRED_ANALYSIS_REPORTS};
use crate::error::AppError;
use crate::reminders::remove_completed_notifications;
use crate::store::analysis::{self, AnalysisDetails, AnalysisHeader, StoredImage};
use crate::web::form::FormData;
use crate::web::upload::Upload;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use common::model::analysis::DocumentationSlot;
use common::model::choices::{label_of, PROBLEMS, SECTION_TRACKS};
use common::model::notification::NotificationType;
use common::model::user::User;
use log::info;
use rusqlite::Connection;

fn required_date(form: &FormData, name: &str, label: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let date = form.date(name);
    if date.is_none() {
        errors.push(format!("{}: tanggal wajib diisi.", label));
    }
    date
}

/// Validates step 1 for `foreman`. The e-mail falls back to the account's.
pub fn parse_header(form: &FormData, foreman: &User) -> Result<AnalysisHeader, AppError> {
    let mut errors = Vec::new();
    let section_track = form.opt("section_track");
    if let Some(section) = &section_track {
        if !SECTION_TRACKS.contains(&section.as_str()) {
            errors.push("Section track tidak dikenal.".to_owned());
        }
    }
    let problem = form.opt("problem");
    if let Some(code) = &problem {
        if label_of(PROBLEMS, code).is_none() {
            errors.push("Problem tidak dikenal.".to_owned());
        }
    }
    let title_problem = form.text("title_problem");
    if title_problem.is_empty() {
        errors.push("Title problem wajib diisi.".to_owned());
    }
    let report_date = required_date(form, "report_date", "Report date", &mut errors);
    let wo_date = required_date(form, "wo_date", "WO date", &mut errors);
    let trouble_date = required_date(form, "trouble_date", "Trouble date", &mut errors);

    match (report_date, wo_date, trouble_date) {
        (Some(report_date), Some(wo_date), Some(trouble_date)) if errors.is_empty() => {
            Ok(AnalysisHeader {
                foreman_id: foreman.id,
                section_track,
                email: form.opt("email").or_else(|| Some(foreman.email.clone())),
                no_report: form.opt("no_report"),
                report_date,
                wo_number: form.opt("wo_number"),
                wo_date,
                unit_code: form.opt("unit_code"),
                problem,
                trouble_date,
                hm: form.opt("hm"),
                title_problem,
                part_no: form.opt("part_no"),
                part_name: form.opt("part_name"),
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

pub fn create_analysis_report(
    conn: &Connection,
    foreman: &User,
    form: &FormData,
    now: NaiveDateTime,
) -> Result<i64, AppError> {
    let header = parse_header(form, foreman)?;
    let id = analysis::insert(conn, &header, now)?;
    info!("Analysis report {} started by {}", id, foreman.username);
    Ok(id)
}

pub fn parse_details(form: &FormData) -> AnalysisDetails {
    AnalysisDetails {
        component_function: form.opt("component_function"),
        symptoms: form.opt("symptoms"),
        root_cause: form.opt("root_cause"),
        factor_man: form.opt("factor_man"),
        factor_material: form.opt("factor_material"),
        factor_machine: form.opt("factor_machine"),
        factor_method: form.opt("factor_method"),
        factor_environment: form.opt("factor_environment"),
        action_taken: form.opt("action_taken"),
        preventive_action: form.opt("preventive_action"),
    }
}

/// Checks a documentation upload: at most 1 MiB and decodable as an image.
pub fn check_image(upload: &Upload) -> Result<StoredImage, String> {
    if upload.truncated || upload.bytes.len() > MAX_IMAGE_BYTES {
        return Err("File size tidak boleh lebih dari 1MB".to_owned());
    }
    let format = image::guess_format(&upload.bytes)
        .map_err(|_| "File dokumentasi harus berupa gambar.".to_owned())?;
    image::load_from_memory_with_format(&upload.bytes, format)
        .map_err(|_| "File dokumentasi harus berupa gambar.".to_owned())?;
    Ok(StoredImage {
        bytes: upload.bytes.clone(),
        mime: format.to_mime_type().to_owned(),
    })
}

fn slot_of(field: &str) -> Option<DocumentationSlot> {
    let name = field.strip_prefix("documentation_").unwrap_or(field);
    DocumentationSlot::parse(name)
}

/// Saves step 2. An upload slot left empty keeps its stored image.
pub fn complete_analysis_report(
    conn: &Connection,
    foreman: &User,
    report_id: i64,
    form: &FormData,
    uploads: &[Upload],
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let mut errors = Vec::new();
    let mut images = Vec::new();
    for upload in uploads {
        let Some(slot) = slot_of(&upload.field) else {
            continue;
        };
        match check_image(upload) {
            Ok(image) => images.push((slot, image)),
            Err(message) => errors.push(format!("Dokumentasi {}: {}", slot.as_str(), message)),
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let tx = conn.unchecked_transaction()?;
    analysis::update_details(&tx, report_id, &parse_details(form))?;
    for (slot, image) in &images {
        analysis::store_image(&tx, report_id, *slot, image)?;
    }
    tx.commit()?;

    let today = now.date();
    let this_month = analysis::count_in_month(conn, foreman.id, today.year(), today.month())?;
    if this_month >= REQUIRED_ANALYSIS_REPORTS {
        remove_completed_notifications(conn, foreman.id, NotificationType::AnalysisReminder)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::testing::{insert_user, memory_conn};
    use common::model::choices::Role;
    use std::io::Cursor;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData::from(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    fn step1() -> FormData {
        form(&[
            ("section_track", "PC1250"),
            ("report_date", "2025-03-10"),
            ("wo_date", "2025-03-09"),
            ("trouble_date", "2025-03-08"),
            ("problem", "1000"),
            ("title_problem", "Engine overheat"),
        ])
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn upload(field: &str, bytes: Vec<u8>) -> Upload {
        Upload {
            field: field.into(),
            filename: "foto.png".into(),
            content_type: Some("image/png".into()),
            bytes,
            truncated: false,
        }
    }

    #[test]
    fn step1_defaults_email_to_account() {
        let conn = memory_conn();
        let foreman = insert_user(&conn, "mek", Role::Foreman);
        let header = parse_header(&step1(), &foreman).unwrap();
        assert_eq!(header.email.as_deref(), Some("mek@rml.test"));
        assert_eq!(header.problem.as_deref(), Some("1000"));
    }

    #[test]
    fn step1_rejects_unknown_codes_and_missing_title() {
        let conn = memory_conn();
        let foreman = insert_user(&conn, "mek", Role::Foreman);
        let bad = form(&[
            ("section_track", "XX"),
            ("problem", "1234"),
            ("report_date", "2025-03-10"),
            ("wo_date", "2025-03-10"),
            ("trouble_date", "2025-03-10"),
        ]);
        match parse_header(&bad, &foreman).unwrap_err() {
            AppError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn images_must_decode_and_fit() {
        assert_eq!(check_image(&upload("documentation_before", png_bytes())).unwrap().mime, "image/png");
        assert!(check_image(&upload("documentation_before", b"not an image".to_vec())).is_err());
        let mut big = upload("documentation_after", png_bytes());
        big.truncated = true;
        assert_eq!(
            check_image(&big).unwrap_err(),
            "File size tidak boleh lebih dari 1MB"
        );
    }

    #[test]
    fn step2_keeps_existing_image_when_slot_empty() {
        let conn = memory_conn();
        let foreman = insert_user(&conn, "mek", Role::Foreman);
        let id = create_analysis_report(&conn, &foreman, &step1(), now()).unwrap();

        let texts = form(&[("root_cause", "Radiator kotor"), ("factor_machine", "Fan rusak")]);
        complete_analysis_report(
            &conn,
            &foreman,
            id,
            &texts,
            &[upload("documentation_before", png_bytes())],
            now(),
        )
        .unwrap();
        complete_analysis_report(&conn, &foreman, id, &texts, &[], now()).unwrap();

        let report = analysis::get(&conn, id).unwrap();
        assert!(report.has_documentation_before);
        assert!(!report.has_documentation_after);
        assert_eq!(report.factors_4m1e(), vec!["Machine (Mesin)"]);
    }
}
