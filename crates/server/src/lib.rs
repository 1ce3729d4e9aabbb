//! HTTP API for docshift.
//!
//! Exposes the two managed directories (`raw` holds documents waiting to be
//! converted, `prepared` holds the results) and triggers conversion batches.

pub mod error;
mod handlers;
mod types;

use crate::error::{ApiError, ErrorKind, Result};
use axum::Router;
use axum::routing::{delete, get, post};
use docshift_config::Settings;
use docshift_convert::engine::EngineHandle;
use docshift_storage::ManagedDir;
use exn::ResultExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use crate::handlers::*;
pub use crate::types::*;

pub const RAW: &str = "raw";
pub const PREPARED: &str = "prepared";

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub raw: ManagedDir,
    pub prepared: ManagedDir,
    pub engine: EngineHandle,
    /// Held for the duration of a conversion batch.
    pub batch: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(settings: Settings, engine: EngineHandle) -> Result<Self> {
        let raw = ManagedDir::new(RAW, &settings.raw_dir)
            .or_raise(|| ErrorKind::DataDir(settings.raw_dir.display().to_string()))?;
        let prepared = ManagedDir::new(PREPARED, &settings.prepared_dir)
            .or_raise(|| ErrorKind::DataDir(settings.prepared_dir.display().to_string()))?;
        Ok(Self { settings: Arc::new(settings), raw, prepared, engine, batch: Arc::new(Mutex::new(())) })
    }

    /// Look up a managed directory by its public name.
    pub fn dir(&self, name: &str) -> std::result::Result<&ManagedDir, ApiError> {
        match name {
            RAW => Ok(&self.raw),
            PREPARED => Ok(&self.prepared),
            _ => Err(ApiError::bad_request("Invalid path. Use 'raw' or 'prepared'")),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/convert", post(convert))
        .route("/files/{path}", get(list_files))
        .route("/delete/{path}/{file}", delete(delete_file))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server and run it until the process is stopped.
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.settings.bind_address();
    tracing::info!(raw = %state.raw.root().display(), prepared = %state.prepared.root().display(), "Data directories");
    tracing::info!(
        engine = %state.engine.describe(),
        available = state.engine.is_available(),
        "Conversion engine"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await.or_raise(|| ErrorKind::Bind(addr.clone()))?;
    tracing::info!(%addr, "Starting API server");
    axum::serve(listener, build_router(state)).await.or_raise(|| ErrorKind::Serve)
}
