//! Application setup and initialization
//!
//! All wiring between configuration, database, object store, services and routes.

pub mod args;
pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use mydms_core::AppConfig;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: &AppConfig) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config.database).await?;

    // Setup storage
    let storage = storage::setup_storage(config).await?;

    // Initialize all services and repositories
    let state = services::initialize_services(config, pool, storage)
        .await
        .context("Failed to initialize services")?;

    // Setup routes
    let router = routes::setup_routes(config, state.clone())?;

    Ok((state, router))
}
