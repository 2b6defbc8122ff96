use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use shortstash::config::Config;
use shortstash::services::{
    AppStartTime, HealthService, HomeService, RedirectService, ShortenService,
};
use shortstash::session::SessionManager;
use shortstash::storages::{Storage, StorageFactory, SweepTrigger};
use shortstash::system::logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;
    let _log_guard = logging::init_logging(&config);

    let storage: Arc<dyn Storage> =
        StorageFactory::create(&config).context("failed to initialize storage")?;
    info!("using storage backend: {}", storage.backend_name().await);

    let sessions = web::Data::new(SessionManager::new());
    let sweep = web::Data::new(SweepTrigger::default());
    let storage_data = web::Data::new(storage);
    let config_data = web::Data::new(config.clone());
    let start_time_data = web::Data::new(app_start_time);

    let bind_address = format!("{}:{}", config.server_host, config.server_port);
    info!("starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(sessions.clone())
            .app_data(sweep.clone())
            .app_data(storage_data.clone())
            .app_data(config_data.clone())
            .app_data(start_time_data.clone())
            .route("/", web::get().to(HomeService::handle_index))
            .route("/", web::post().to(ShortenService::handle_create))
            .route("/health", web::get().to(HealthService::health_check))
            .route("/{code}", web::get().to(RedirectService::handle_redirect))
            .route("/{code}", web::head().to(RedirectService::handle_redirect))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
