pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod notes;
pub mod server;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use analysis::AnalysisService;
use config::AppConfig;
use db::Database;
use validation::Schema;

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) db: Database,
    pub(crate) analyses: Arc<AnalysisService>,
    pub(crate) analysis_schema: Arc<Schema>,
    pub(crate) note_schema: Arc<Schema>,
}

impl AppState {
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            analyses: Arc::new(AnalysisService::new(Arc::new(db.clone()))),
            analysis_schema: Arc::new(analysis::routes::create_schema(config)),
            note_schema: Arc::new(notes::routes::note_schema()),
            db,
        }
    }
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    utils::logging::init();

    info!("wordlens starting up...");

    let config = AppConfig::load()?;
    let addr = config.bind_addr()?;
    let database = Database::new(config.database_path())?;
    let state = AppState::new(database, &config);

    let shutdown = CancellationToken::new();
    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(err) => {
                    error!("Failed to listen for shutdown signal: {err}");
                    return;
                }
            }
            token.cancel();
        });
    }

    server::serve(state, addr, shutdown).await
}
