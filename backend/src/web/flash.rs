//! One-shot messages carried in the session until the next rendered page.

use crate::error::AppError;
use actix_session::Session;
use serde::{Deserialize, Serialize};

const FLASH_KEY: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

pub fn push(session: &Session, level: Level, message: impl Into<String>) -> Result<(), AppError> {
    let mut pending: Vec<Flash> = session.get(FLASH_KEY)?.unwrap_or_default();
    pending.push(Flash {
        level,
        message: message.into(),
    });
    session.insert(FLASH_KEY, pending)?;
    Ok(())
}

/// Removes and returns every pending message.
pub fn take(session: &Session) -> Result<Vec<Flash>, AppError> {
    Ok(session.remove_as::<Vec<Flash>>(FLASH_KEY)
        .and_then(Result::ok)
        .unwrap_or_default())
}

pub fn success(session: &Session, message: impl Into<String>) -> Result<(), AppError> {
    push(session, Level::Success, message)
}

pub fn error(session: &Session, message: impl Into<String>) -> Result<(), AppError> {
    push(session, Level::Error, message)
}

pub fn warning(session: &Session, message: impl Into<String>) -> Result<(), AppError> {
    push(session, Level::Warning, message)
}
