//! Application error type shared by the store, the document generators and
//! the HTTP handlers.

use crate::auth::password::PasswordError;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] genpdf::error::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("password error: {0}")]
    Password(#[from] PasswordError),
    #[error("session error: {0}")]
    Session(String),
    #[error("{0} tidak ditemukan")]
    NotFound(String),
    /// Authenticated but not allowed; the user is sent back to `redirect_to`.
    #[error("akses ditolak")]
    Forbidden { redirect_to: &'static str },
    #[error("login diperlukan")]
    Unauthenticated,
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl From<actix_session::SessionInsertError> for AppError {
    fn from(e: actix_session::SessionInsertError) -> Self {
        AppError::Session(e.to_string())
    }
}

impl From<actix_session::SessionGetError> for AppError {
    fn from(e: actix_session::SessionGetError) -> Self {
        AppError::Session(e.to_string())
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for AppError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        AppError::Internal(e.to_string())
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::Forbidden { .. } => StatusCode::SEE_OTHER,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthenticated => see_other("/login/"),
            AppError::Forbidden { redirect_to } => see_other(redirect_to),
            AppError::NotFound(_) | AppError::Validation(_) | AppError::BadRequest(_) => {
                HttpResponse::build(self.status_code())
                    .content_type("text/plain; charset=utf-8")
                    .body(self.to_string())
            }
            other => {
                error!("{}", other);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("Terjadi kesalahan pada server.")
            }
        }
    }
}
