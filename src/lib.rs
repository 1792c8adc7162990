/// Public library interface for the Zenith habit tracker
///
/// This module exports the domain types, the storage and auth seams, the
/// habit collection controller, and the JSON-RPC server that puts them
/// together.

use std::sync::Arc;

use thiserror::Error;

pub mod app;
pub mod auth;
pub mod collection;
pub mod config;
pub mod domain;
pub mod rpc;
pub mod storage;

// Re-export public modules and types
pub use app::{AppError, HabitTrackerApp};
pub use auth::{AuthError, AuthGateway, LocalAuthGateway, Session};
pub use collection::{CollectionError, HabitCollection, Intent};
pub use config::Config;
pub use domain::*;
pub use rpc::RpcServer;
pub use storage::{AccountStore, HabitStore, MemoryStorage, SqliteStorage, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

type SqliteApp = HabitTrackerApp<SqliteStorage, LocalAuthGateway<SqliteStorage>, SystemClock>;

/// SQLite-backed habit tracker served over stdin/stdout
pub struct ZenithServer {
    storage: Arc<SqliteStorage>,
    rpc: RpcServer<SqliteStorage, LocalAuthGateway<SqliteStorage>, SystemClock>,
}

impl ZenithServer {
    /// Open the database named in `config` and wire up the application
    ///
    /// The schema is created or migrated on open.
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        tracing::info!("Initializing Zenith server with database: {:?}", config.database);

        let storage = Arc::new(SqliteStorage::new(config.database.clone())?);
        let auth = LocalAuthGateway::new(storage.clone());
        let clock = Arc::new(SystemClock::new(config.day_boundary));
        tracing::info!("Calendar days end at midnight {}", config.day_boundary);

        let app: SqliteApp = HabitTrackerApp::new(storage.clone(), auth, clock);

        Ok(Self {
            storage,
            rpc: RpcServer::new(app),
        })
    }

    /// Handle JSON-RPC requests until stdin closes
    pub async fn run(mut self) -> Result<(), ServerError> {
        self.rpc.run().await
    }

    pub fn app(&self) -> &SqliteApp {
        self.rpc.app()
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }
}
