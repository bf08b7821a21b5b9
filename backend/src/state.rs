//! Shared application state, injected into every handler as `web::Data<AppState>`.

use crate::config::AppConfig;
use crate::pipeline::blob::TempBlobStorage;
use crate::pipeline::UploadOrchestrator;
use crate::store::{AgentStore, RecordStore, SqliteStore, UserStore};
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub agents: Arc<dyn AgentStore>,
    pub records: Arc<dyn RecordStore>,
    pub users: Arc<dyn UserStore>,
    pub uploads: Arc<UploadOrchestrator>,
}

impl AppState {
    /// Wires every collaborator to the one SQLite store.
    pub fn new(config: AppConfig, store: Arc<SqliteStore>, blobs: Arc<dyn TempBlobStorage>) -> Self {
        let uploads = Arc::new(UploadOrchestrator::new(
            store.clone(),
            store.clone(),
            blobs,
            config.upload.clone(),
        ));
        Self {
            config,
            agents: store.clone(),
            records: store.clone(),
            users: store,
            uploads,
        }
    }
}
