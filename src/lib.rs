//! incidentd -- incident tracking daemon with a queryable dashboard API.
//!
//! This crate provides the incident store, filtered queries and dashboard
//! aggregate counts, bulk status/assignment mutations, and synthetic
//! incident generation, served over an axum HTTP API.

pub mod api;
pub mod config;
pub mod incident;
pub mod storage;

use crate::api::state::AppState;
use crate::config::Config;
use crate::incident::generate::Generator;
use crate::incident::query::QueryEngine;
use crate::incident::store::IncidentStore;
use anyhow::Result;

/// Open the database, run migrations, and seed the incident table if it
/// is empty. Safe to call repeatedly.
pub fn open_storage(db_path: &str) -> Result<storage::Pool> {
    let pool = storage::open_pool(db_path)?;
    let seeded = IncidentStore::new(pool.clone()).seed_if_empty()?;
    if seeded > 0 {
        tracing::info!(rows = seeded, "Seeded incident table");
    }
    Ok(pool)
}

/// Start the incidentd daemon: storage plus API server.
pub async fn serve(config: &Config) -> Result<()> {
    tracing::info!(db_path = %config.db_path, "Initializing database");
    let pool = open_storage(&config.db_path)?;

    let state = AppState {
        store: IncidentStore::new(pool.clone()),
        query: QueryEngine::new(pool.clone(), config.current_user.clone()),
        generator: Generator::new(pool),
    };
    let app = api::router(state);

    let addr: std::net::SocketAddr = config.bind.parse()?;
    tracing::info!(%addr, "incidentd listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
