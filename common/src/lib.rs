//! Data model shared by the web backend and its scheduler binaries.
//!
//! Everything here is plain serde data: rows as they come out of the
//! database, the fixed choice lists of the paper forms, and the JSON request
//! payloads accepted by the API endpoints.

pub mod jobs;
pub mod model;
pub mod requests;
