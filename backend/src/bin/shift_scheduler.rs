//! Applies the planned shift of every foreman once at startup and then every
//! day at 00:01.

use backend::config::AppConfig;
use backend::db::Database;
use backend::job_controller::runner::{CronJob, JobOutcome, JobTask, Runner};
use backend::job_controller::state::{start_job_updater, JobsState};
use backend::shifts::apply_today_shifts;
use backend::telegram::Telegram;
use chrono::NaiveDateTime;
use env_logger::Env;
use log::{error, info};
use rusqlite::Connection;
use std::sync::Arc;

const JOB_NAME: &str = "apply_daily_shifts";
const DAILY_AT_0001: &str = "0 1 0 * * *";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let db = Database::open(&config.database_path).map_err(std::io::Error::other)?;

    let (jobs, rx) = JobsState::new();
    tokio::spawn(start_job_updater(jobs.clone(), rx));
    let runner = Runner::new(db, jobs, Telegram::disabled());

    let apply: JobTask = Arc::new(|conn: &Connection, now: NaiveDateTime| {
        let updated = apply_today_shifts(conn, now.date(), now)?;
        Ok(JobOutcome::summary(format!("{} shift(s) applied", updated)))
    });

    runner.run_now(JOB_NAME, apply.clone(), 0).await;

    match CronJob::new(JOB_NAME, DAILY_AT_0001, apply) {
        Ok(job) => {
            info!("Shift scheduler started");
            runner.run_forever(vec![job]).await;
        }
        Err(e) => error!("Cannot schedule {}: {}", JOB_NAME, e),
    }
    Ok(())
}
