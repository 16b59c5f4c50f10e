mod clients;
mod config;
mod error;
mod job_controller;
mod services;
mod state;
mod sync;

use crate::clients::google::GoogleClient;
use crate::clients::sqlite::SqliteStore;
use crate::config::AppConfig;
use crate::job_controller::state::{start_job_updater, JobsState};
use crate::state::cache::PayloadCache;
use crate::state::revision_store::FileRevisionStore;
use crate::sync::coordinator::SyncService;
use crate::sync::poll::run_poll_loop;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let google = GoogleClient::new(
        config.access_token.clone(),
        &config.sheets_url,
        &config.drive_url,
    )
    .map_err(|e| {
        error!("could not build the HTTP client: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let google = Arc::new(google);
    let service = Arc::new(SyncService::new(
        Arc::new(FileRevisionStore::new(&config.state_dir)),
        google.clone(),
        google,
        Arc::new(SqliteStore::new(&config.db_path)),
        PayloadCache::new(&config.state_dir),
        config.sync_options(),
    ));

    // Job controller for manual syncs
    let (jobs_state, rx) = JobsState::new(100);
    tokio::spawn(start_job_updater(jobs_state.clone(), rx));

    tokio::spawn(run_poll_loop(service.clone(), config.poll_interval));

    info!(
        "Server running at http://{}:{} (table {}, database {})",
        config.host,
        config.port,
        config.table_name,
        config.db_path.display()
    );

    let service = web::Data::from(service);
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(service.clone())
            .service(services::files::configure_routes())
            .service(services::sheets::configure_routes())
            .service(services::sync::configure_routes())
            .service(services::tables::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
