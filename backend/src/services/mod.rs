//! # HTTP services
//!
//! Routes grouped per area. Every area module exposes `configure_routes()`
//! returning its `Scope`; `crate::configure_app` mounts them all.
//!
//! HTML handlers lock the database once, check the caller's role with
//! `auth::require_role`, then either render a page or answer a form post
//! with a flash message and a `303` redirect. Validation failures coming back
//! from the `forms` layer are flashed and the form is shown again.

pub mod accounts;
pub mod admin;
pub mod api;
pub mod exports;
pub mod filters;
pub mod foreman;
pub mod leader;
pub mod notifications;
pub mod reports;

use crate::documents::Attachment;
use crate::error::AppError;
use crate::reminders::Delivered;
use crate::telegram::Telegram;
use crate::web::flash;
use actix_session::Session;
use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::HttpResponse;

/// Separates validation failures, shown on the form, from real errors.
pub(crate) fn split_validation<T>(
    result: Result<T, AppError>,
) -> Result<Result<T, Vec<String>>, AppError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(AppError::Validation(messages)) => Ok(Err(messages)),
        Err(other) => Err(other),
    }
}

pub(crate) fn flash_errors(session: &Session, messages: &[String]) -> Result<(), AppError> {
    for message in messages {
        flash::error(session, message.clone())?;
    }
    Ok(())
}

/// `attachment` disposition with a quote-safe ASCII name, plus the UTF-8
/// name when the original is not ASCII.
fn content_disposition(filename: &str) -> ContentDisposition {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    let mut disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(fallback)],
    };
    if !filename.is_ascii() {
        disposition
            .parameters
            .push(DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_owned()),
                language_tag: None,
                value: filename.as_bytes().to_vec(),
            }));
    }
    disposition
}

/// Sends a rendered file as a download.
pub(crate) fn download(file: Attachment) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header(content_disposition(&file.filename))
        .body(file.bytes)
}

/// Forwards freshly created notifications to Telegram.
pub(crate) fn deliver(telegram: &Telegram, delivered: &Delivered) {
    for (user, notification) in delivered {
        telegram.dispatch(user, notification);
    }
}
