//! Sends the automatic reminders: the one-hour pre-deadline reminder of each
//! shift, the five-minute deadline sweep and the end-of-month analysis check.
//!
//! A job whose schedule cannot be built is logged and skipped; the other jobs
//! keep running.

use backend::config::AppConfig;
use backend::db::Database;
use backend::job_controller::runner::{CronJob, JobOutcome, JobTask, Runner};
use backend::job_controller::state::{start_job_updater, JobsState};
use backend::reminders::{
    check_activity_reminders, check_analysis_reminders, send_pre_deadline_reminders,
};
use backend::store::notifications::purge_expired;
use backend::telegram::Telegram;
use chrono::NaiveDateTime;
use common::model::choices::Shift;
use env_logger::Env;
use log::{info, warn};
use rusqlite::Connection;
use std::sync::Arc;

fn pre_deadline(shift: Shift) -> JobTask {
    Arc::new(move |conn: &Connection, now: NaiveDateTime| {
        Ok(JobOutcome::reminders(send_pre_deadline_reminders(conn, shift, now)?))
    })
}

fn sweep() -> JobTask {
    Arc::new(|conn: &Connection, now: NaiveDateTime| {
        let purged = purge_expired(conn, now)?;
        let mut delivered = check_activity_reminders(conn, now)?;
        delivered.extend(check_analysis_reminders(conn, now)?);
        let mut outcome = JobOutcome::reminders(delivered);
        if purged > 0 {
            outcome.summary.push_str(&format!(", {} expired removed", purged));
        }
        Ok(outcome)
    })
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let db = Database::open(&config.database_path).map_err(std::io::Error::other)?;
    let telegram = Telegram::new(config.telegram_bot_token.clone());

    let (jobs, rx) = JobsState::new();
    tokio::spawn(start_job_updater(jobs.clone(), rx));
    let runner = Runner::new(db, jobs, telegram);

    // Catch up after a restart.
    runner.run_now("startup_shift1", pre_deadline(Shift::First), 0).await;
    runner.run_now("startup_shift2", pre_deadline(Shift::Second), 0).await;

    let planned = [
        ("pre_deadline_shift1", "0 0 17 * * *", pre_deadline(Shift::First)),
        ("pre_deadline_shift2", "0 0 4 * * *", pre_deadline(Shift::Second)),
        ("reminder_sweep", "0 */5 * * * *", sweep()),
    ];
    let mut scheduled = Vec::new();
    for (name, expression, task) in planned {
        match CronJob::new(name, expression, task) {
            Ok(job) => scheduled.push(job),
            Err(e) => warn!("Skipping job {}: {}", name, e),
        }
    }

    info!("Notification scheduler started with {} job(s)", scheduled.len());
    runner.run_forever(scheduled).await;
    Ok(())
}
