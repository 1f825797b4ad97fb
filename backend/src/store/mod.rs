//! Row-level access to the SQLite tables.
//!
//! Every function takes a borrowed `Connection` so that callers decide the
//! transaction scope; nothing here locks or opens a database on its own.

pub mod activity;
pub mod analysis;
pub mod notifications;
pub mod quotas;
pub mod shifts;
pub mod users;
