use serde::{Deserialize, Serialize};

/// Lifecycle of a scheduled job run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(String),
    Failed(String),
    Skipped(String),
}
