//! Tracks the status of scheduled job runs.
//!
//! Jobs never write the status map directly. They push `JobUpdate` messages
//! through `JobsState::tx` and `start_job_updater` applies them, logging
//! every transition.

use common::jobs::JobStatus;
use log::{error, info, warn};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

const CHANNEL_CAPACITY: usize = 100;

/// Shared view of the latest status of every job, keyed by job name.
#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates the state together with the receiver `start_job_updater` drains.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Queues a status change. A closed channel only loses the log line.
    pub async fn report(&self, job_id: &str, status: JobStatus) {
        let update = JobUpdate {
            job_id: job_id.to_owned(),
            status,
        };
        if let Err(e) = self.tx.send(update).await {
            warn!("Job update for {} dropped: {}", job_id, e);
        }
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

fn log_transition(job_id: &str, status: &JobStatus) {
    match status {
        JobStatus::Pending => info!("[{}] scheduled", job_id),
        JobStatus::InProgress(run) => info!("[{}] run #{} started", job_id, run),
        JobStatus::Completed(summary) => info!("[{}] completed: {}", job_id, summary),
        JobStatus::Skipped(reason) => warn!("[{}] skipped: {}", job_id, reason),
        JobStatus::Failed(reason) => error!("[{}] failed: {}", job_id, reason),
    }
}

/// Applies updates until every sender is dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        log_transition(&update.job_id, &update.status);
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn updater_keeps_latest_status() {
        let (state, rx) = JobsState::new();
        tokio::spawn(start_job_updater(state.clone(), rx));

        state.report("sweep", JobStatus::InProgress(1)).await;
        state
            .report("sweep", JobStatus::Completed("2 reminders".into()))
            .await;

        let expected = JobStatus::Completed("2 reminders".into());
        for _ in 0..100 {
            if state.status("sweep").await.as_ref() == Some(&expected) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("status never reached {:?}", expected);
    }
}
