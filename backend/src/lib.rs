//! Maintenance operations tracker: activity and technical analysis reports
//! of mechanic foremen, validated by their leaders and overseen by
//! administrators.
//!
//! The crate is used by the web server binary and by the scheduler and
//! maintenance binaries under `src/bin`.

pub mod auth;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod forms;
pub mod job_controller;
pub mod reminders;
pub mod services;
pub mod shifts;
pub mod store;
pub mod telegram;
pub mod web;

use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::Key;
use actix_web::web::{JsonConfig, ServiceConfig};
use config::AppConfig;

const SESSION_COOKIE: &str = "monman_session";
const JSON_LIMIT: usize = 1024 * 1024;

/// Mounts every route area. The root scope of `accounts` matches every path
/// and therefore goes last.
pub fn configure_app(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().limit(JSON_LIMIT))
        .service(services::admin::configure_routes())
        .service(services::foreman::configure_routes())
        .service(services::foreman::configure_workspace_routes())
        .service(services::reports::configure_activity_routes())
        .service(services::reports::configure_analysis_routes())
        .service(services::leader::configure_routes())
        .service(services::exports::configure_routes())
        .service(services::notifications::configure_routes())
        .service(services::api::configure_routes())
        .service(services::accounts::configure_routes());
}

/// Signing key of the session cookie. Without a configured key every restart
/// logs everybody out.
pub fn session_key(config: &AppConfig) -> Key {
    match &config.session_key {
        Some(bytes) => Key::from(bytes.as_slice()),
        None => Key::generate(),
    }
}

pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .session_lifecycle(PersistentSession::default().session_ttl(CookieDuration::hours(12)))
        .build()
}
