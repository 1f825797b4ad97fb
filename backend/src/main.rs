use actix_web::{middleware::Logger, web, App, HttpServer};
use backend::config::AppConfig;
use backend::db::Database;
use backend::telegram::Telegram;
use backend::web::templates::Templates;
use backend::{configure_app, session_key, session_middleware};
use env_logger::Env;
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::other(e)
    })?;
    let db = Database::open(&config.database_path).map_err(std::io::Error::other)?;
    let templates = Templates::load().map_err(std::io::Error::other)?;
    let telegram = Telegram::new(config.telegram_bot_token.clone());
    if !telegram.is_enabled() {
        info!("Telegram delivery disabled");
    }
    let key = session_key(&config);
    let address = config.bind_address();

    let db = web::Data::new(db);
    let templates = web::Data::new(templates);
    let telegram = web::Data::new(telegram);
    let config = web::Data::new(config);

    info!("Server running at http://{}", address);

    HttpServer::new(move || {
        App::new()
            .wrap(session_middleware(key.clone()))
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(templates.clone())
            .app_data(telegram.clone())
            .app_data(config.clone())
            .configure(configure_app)
    })
    .bind(address)?
    .run()
    .await
}
