//! Background job plumbing shared by the scheduler binaries.

pub mod runner;
pub mod state;
