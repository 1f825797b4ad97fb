//! Form parsing and validation.
//!
//! Each form is read from a [`FormData`](crate::web::form::FormData), checked
//! against the database where needed, and saved. Problems come back as
//! [`AppError::Validation`](crate::error::AppError::Validation) whose
//! messages the handlers flash and re-render the form with.

pub mod activity;
pub mod analysis;
pub mod quota;
pub mod user;
