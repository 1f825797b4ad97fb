//! Plans the Shift 1 / Shift 2 / Stop rotation of every foreman.

use backend::config::AppConfig;
use backend::db::{self, Database};
use backend::shifts::{generate_shift_week, DEFAULT_DEPARTMENT};
use chrono::NaiveDate;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "Generate shift schedules for all foremen: Shift 1, Shift 2, Stop")]
struct Args {
    /// First day to plan, YYYY-MM-DD (default: today)
    #[arg(long)]
    start: Option<String>,

    /// Number of days to plan
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Department written on the schedules
    #[arg(long, default_value = DEFAULT_DEPARTMENT)]
    department: String,

    /// SQLite database file
    #[arg(long, env = "MONMAN_DATABASE")]
    database: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let args = Args::parse();

    let start = match &args.start {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(day) => day,
            Err(_) => {
                error!("Invalid --start date format. Use YYYY-MM-DD.");
                return ExitCode::FAILURE;
            }
        },
        None => db::now().date(),
    };
    let path: PathBuf = match args.database {
        Some(path) => path.into(),
        None => match AppConfig::from_env() {
            Ok(config) => config.database_path,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let result = Database::open(path).and_then(|database| {
        let conn = database.conn()?;
        generate_shift_week(&conn, start, args.days, &args.department, db::now())
    });
    match result {
        Ok(week) if week.created + week.updated == 0 => {
            warn!("No foremen found. Nothing to schedule.");
            ExitCode::SUCCESS
        }
        Ok(week) => {
            info!(
                "Generated schedules for {} day(s). Created: {}, Updated: {}.",
                args.days, week.created, week.updated
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Shift generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
