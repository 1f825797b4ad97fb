//! Creates the first administrator account.

use backend::auth::password::hash_password;
use backend::config::AppConfig;
use backend::db::{self, Database};
use backend::error::AppError;
use backend::store::users::{self, NewUser};
use clap::Parser;
use common::model::choices::{Role, Shift};
use env_logger::Env;
use log::{error, info};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "Create a superadmin account")]
struct Args {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    /// Read from MONMAN_ADMIN_PASSWORD when omitted
    #[arg(long, env = "MONMAN_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    /// Display name
    #[arg(long)]
    name: Option<String>,
}

fn create(database: &Database, args: &Args) -> Result<i64, AppError> {
    let conn = database.conn()?;
    if users::username_taken(&conn, &args.username, None)? {
        return Err(AppError::validation(format!(
            "Username {} sudah digunakan.",
            args.username
        )));
    }
    let record = NewUser {
        username: args.username.clone(),
        email: args.email.clone(),
        password_hash: hash_password(&args.password)?,
        first_name: String::new(),
        last_name: String::new(),
        name: args.name.clone(),
        phone: None,
        nrp: None,
        telegram_chat_id: None,
        role: Role::Superadmin,
        department: None,
        leader_id: None,
        shift: Shift::First,
        is_active: true,
    };
    users::insert(&conn, &record, db::now())
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let args = Args::parse();
    if args.password.is_empty() {
        error!("Password must not be empty");
        return ExitCode::FAILURE;
    }

    let result = AppConfig::from_env()
        .map_err(|e| AppError::Internal(e.to_string()))
        .and_then(|config| Database::open(&config.database_path))
        .and_then(|database| create(&database, &args));
    match result {
        Ok(id) => {
            info!("Superadmin {} created with id {}", args.username, id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
