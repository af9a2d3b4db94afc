/// Public library interface for the HabitFlow MCP server
///
/// This module exports the server, the storage layer, the pure analytics
/// over habits and completions, and the MCP tools built on top of them.

use std::path::PathBuf;
use thiserror::Error;

pub mod analytics;
pub mod config;
pub mod domain;
pub mod mcp;
pub mod storage;
pub mod tools;

// Re-export public modules and types
pub use analytics::{AnalyticsEngine, Dashboard};
pub use config::{AnalyticsConfig, Config, ConfigError};
pub use domain::*;
pub use storage::{HabitStorage, SqliteStorage, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Habit server that speaks MCP over stdio
///
/// Holds the SQLite store and the analytics engine configured from the
/// `[analytics]` config section.
pub struct HabitFlowServer {
    storage: SqliteStorage,
    analytics: AnalyticsEngine,
}

impl HabitFlowServer {
    /// Open (or create) the database at `db_path`
    pub async fn new(db_path: PathBuf, analytics: AnalyticsConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing HabitFlow server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        Ok(Self::with_storage(storage, analytics))
    }

    pub fn with_storage(storage: SqliteStorage, analytics: AnalyticsConfig) -> Self {
        Self {
            storage,
            analytics: AnalyticsEngine::new(analytics),
        }
    }

    /// Run the MCP server until stdin closes
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        match self.existing_habits() {
            Some(count) => tracing::info!("Server started successfully, found {} existing habits", count),
            None => tracing::warn!("Serving with an unreadable habit store, statistics will be empty"),
        }

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// Number of stored habits, `None` when the store cannot be read
    pub fn existing_habits(&self) -> Option<usize> {
        match self.storage.load_habits() {
            Ok(habits) => Some(habits.len()),
            Err(e) => {
                tracing::warn!("Failed to load habits at startup: {}", e);
                None
            }
        }
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }
}
