//! Cron-driven execution of the scheduler jobs.
//!
//! Each `CronJob` runs on its own task: sleep until the next fire time of its
//! cron expression, run the job body on the blocking pool against the shared
//! database, forward created notifications to Telegram and report the
//! outcome to `JobsState`. A failed run is logged and the job keeps its
//! schedule.

use super::state::JobsState;
use crate::db::{self, Database};
use crate::error::AppError;
use crate::reminders::Delivered;
use crate::telegram::Telegram;
use chrono::{DateTime, Local, NaiveDateTime};
use common::jobs::JobStatus;
use cron::Schedule;
use rusqlite::Connection;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const MIN_SLEEP: Duration = Duration::from_millis(500);

/// What one run produced.
#[derive(Debug, Default)]
pub struct JobOutcome {
    pub summary: String,
    pub delivered: Delivered,
}

impl JobOutcome {
    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            delivered: Vec::new(),
        }
    }

    pub fn reminders(delivered: Delivered) -> Self {
        Self {
            summary: format!("{} notification(s) created", delivered.len()),
            delivered,
        }
    }
}

pub type JobTask =
    Arc<dyn Fn(&Connection, NaiveDateTime) -> Result<JobOutcome, AppError> + Send + Sync>;

pub struct CronJob {
    pub name: String,
    schedule: Schedule,
    task: JobTask,
}

impl CronJob {
    /// `expression` uses the six-field form with seconds first, e.g. `0 1 0 * * *`.
    pub fn new(name: &str, expression: &str, task: JobTask) -> Result<Self, cron::error::Error> {
        Ok(Self {
            name: name.to_owned(),
            schedule: Schedule::from_str(expression)?,
            task,
        })
    }

    pub fn next_run(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(&after).next()
    }
}

#[derive(Clone)]
pub struct Runner {
    db: Database,
    jobs: JobsState,
    telegram: Telegram,
}

impl Runner {
    pub fn new(db: Database, jobs: JobsState, telegram: Telegram) -> Self {
        Self { db, jobs, telegram }
    }

    /// Runs `task` once, right now, and returns the final status.
    pub async fn run_now(&self, name: &str, task: JobTask, run: u32) -> JobStatus {
        self.jobs.report(name, JobStatus::InProgress(run)).await;
        let database = self.db.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<JobOutcome, AppError> {
            let conn = database.conn()?;
            task(&conn, db::now())
        })
        .await;

        let status = match result {
            Ok(Ok(outcome)) => {
                for (user, notification) in &outcome.delivered {
                    self.telegram.dispatch(user, notification);
                }
                JobStatus::Completed(outcome.summary)
            }
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            Err(e) => JobStatus::Failed(format!("job panicked: {}", e)),
        };
        self.jobs.report(name, status.clone()).await;
        status
    }

    async fn drive(self, job: CronJob) {
        let mut run = 0u32;
        loop {
            let now = Local::now();
            let Some(next) = job.next_run(now) else {
                self.jobs
                    .report(&job.name, JobStatus::Skipped("no upcoming run".into()))
                    .await;
                return;
            };
            self.jobs.report(&job.name, JobStatus::Pending).await;
            let wait = (next - now).to_std().unwrap_or(MIN_SLEEP).max(MIN_SLEEP);
            tokio::time::sleep(wait).await;
            run = run.wrapping_add(1);
            self.run_now(&job.name, job.task.clone(), run).await;
        }
    }

    /// Drives every job until the process is stopped.
    pub async fn run_forever(&self, jobs: Vec<CronJob>) {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| tokio::spawn(self.clone().drive(job)))
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Scheduler task stopped: {}", e);
            }
        }
    }
}
