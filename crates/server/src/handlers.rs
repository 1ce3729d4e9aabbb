//! HTTP request handlers for API endpoints.

use crate::AppState;
use crate::error::ApiError;
use crate::types::{
    ConvertResponse, DeleteResponse, DirStats, FileInfo, FileListResponse, HealthResponse, ListQuery, StatsResponse,
};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use docshift_convert::Converter;
use docshift_convert::text::truncate;
use docshift_storage::ManagedDir;
use docshift_storage::error::ErrorKind as StorageErrorKind;

/// Longest error message returned to clients for a failed batch.
const DETAIL_MAX_CHARS: usize = 200;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        libreoffice_available: state.engine.is_available(),
        raw_dir_exists: state.raw.exists(),
        prepared_dir_exists: state.prepared.exists(),
    })
}

/// Convert everything in the raw directory into the prepared directory.
///
/// Only one batch runs at a time; concurrent requests wait for the running
/// batch to finish and then start their own.
pub async fn convert(State(state): State<AppState>) -> Result<Json<ConvertResponse>, ApiError> {
    let _batch = state.batch.lock().await;
    tracing::info!("Starting conversion batch");
    let settings = state.settings.clone();
    let engine = state.engine.clone();
    let summary = tokio::task::spawn_blocking(move || {
        Converter::new(&settings.raw_dir, &settings.prepared_dir, engine)?
            .skip_empty(settings.skip_empty)
            .process()
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Conversion task panicked");
        conversion_failed(&e.to_string())
    })?
    .map_err(|e| {
        if e.is_configuration() {
            tracing::error!(error = ?e, "Unable to initialize converter");
            ApiError::internal(format!("Initialization error: {}", *e))
        } else {
            tracing::error!(error = ?e, "Conversion failed");
            conversion_failed(&(*e).to_string())
        }
    })?;
    Ok(Json(summary.into()))
}

fn conversion_failed(message: &str) -> ApiError {
    ApiError::internal(format!("Conversion failed: {}", truncate(message, DETAIL_MAX_CHARS)))
}

pub async fn list_files(
    State(state): State<AppState>,
    Path(path): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<FileListResponse>, ApiError> {
    let dir = state.dir(&path)?;
    let Query(query) = query.map_err(|e| ApiError::unprocessable(e.body_text()))?;
    let entries = dir.list(query.recursive).await.map_err(|e| {
        tracing::error!(dir = %dir.name(), error = ?e, "Unable to list files");
        ApiError::internal(format!("Failed to list files: {}", *e))
    })?;
    Ok(Json(FileListResponse { path, files: entries.iter().map(FileInfo::from).collect() }))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path((path, file)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let dir = state.dir(&path)?;
    dir.delete(&file).await.map_err(|e| match &*e {
        StorageErrorKind::InvalidPath(_) => ApiError::bad_request("Invalid file path"),
        StorageErrorKind::NotFound(_) => ApiError::not_found("File not found"),
        kind if kind.is_client_error() => ApiError::bad_request(kind.to_string()),
        kind => {
            tracing::error!(dir = %dir.name(), error = %kind, "Unable to delete file");
            ApiError::internal(format!("Delete failed: {kind}"))
        },
    })?;
    Ok(Json(DeleteResponse { success: true, message: format!("File '{file}' deleted from {path}") }))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(StatsResponse { raw_data: dir_stats(&state.raw).await?, prepared_data: dir_stats(&state.prepared).await? }))
}

async fn dir_stats(dir: &ManagedDir) -> Result<DirStats, ApiError> {
    let census = dir.census().await.map_err(|e| {
        tracing::error!(dir = %dir.name(), error = ?e, "Unable to collect statistics");
        ApiError::internal(format!("Failed to collect statistics: {}", *e))
    })?;
    Ok(DirStats::new(dir.root().display().to_string(), census))
}
