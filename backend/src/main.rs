mod config;
mod error;
mod pipeline;
mod services;
mod state;
mod store;

use crate::config::AppConfig;
use crate::pipeline::blob::DiskBlobStorage;
use crate::state::AppState;
use crate::store::{AgentStore, SqliteStore};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    if config.uses_default_secret() {
        warn!("JWT_SECRET is not set; tokens are signed with the development secret");
    }

    let store = Arc::new(SqliteStore::open(&config.database_path).map_err(io::Error::other)?);
    info!("Database opened at {}", config.database_path.display());

    if let Some(seed) = &config.admin {
        services::auth::ensure_admin(&*store, seed, config.bcrypt_cost)
            .map_err(|e| io::Error::other(e.to_string()))?;
    }
    match store.count() {
        Ok(agents) => info!("{} agents available for distribution", agents),
        Err(e) => warn!("could not count agents: {}", e),
    }

    let blobs = Arc::new(DiskBlobStorage::new(&config.upload.upload_dir)?);
    info!("Staging uploads in {}", blobs.dir().display());
    let host = config.host.clone();
    let port = config.port;
    let state = web::Data::new(AppState::new(config, store, blobs));

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(services::json_config())
            .app_data(state.clone())
            .configure(services::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
