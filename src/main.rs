use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod pages;
mod routes;
mod utils;

use config::Config;
use db::{init_db, migrate};

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

fn init_tracing(config: &Config) -> WorkerGuard {
    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let builder = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    if config.environment.is_production() {
        builder.with_max_level(tracing::Level::INFO).init();
    } else {
        builder.with_max_level(tracing::Level::DEBUG).pretty().init();
    }

    guard
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // keep the guard alive or buffered log lines are lost on exit
    let _guard = init_tracing(&config);
    if config.dev_secret {
        warn!("SESSION_SECRET not set, using the development secret");
    }

    info!(
        addr = %config.server_addr,
        backend = ?config.backend,
        environment = ?config.environment,
        "Server starting..."
    );

    let pool = init_db(&config)
        .await
        .context("Failed to connect to database")?;
    migrate(&pool, config.backend)
        .await
        .context("Failed to create tables")?;

    let templates = pages::load_templates().context("Failed to load templates")?;
    let limiter = routes::presence_limiter(&config)?;
    let flash_secret = config.session_secret.clone();
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(pages::flash::message_framework(&flash_secret))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(templates.clone()))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, &limiter))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
