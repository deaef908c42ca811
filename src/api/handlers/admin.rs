use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::ReferenceSeed;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub teachers: usize,
    pub admins: usize,
    pub schools: usize,
    pub subjects: usize,
    pub vacancies: usize,
    pub reciprocal_matches: usize,
    pub top_matches: usize,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Replace every reference table from a JSON payload. Test-mode only; in
/// production the tables are populated by the external pipeline (startup
/// seed file).
pub async fn import_reference(
    State(state): State<Arc<AppState>>,
    AppJson(seed): AppJson<ReferenceSeed>,
) -> Result<Json<JSend<ImportResponse>>, ApiError> {
    state
        .db
        .replace_reference(&seed)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(
        teachers = seed.teachers.len(),
        vacancies = seed.vacancies.len(),
        "Replaced reference tables"
    );

    Ok(JSend::success(ImportResponse {
        teachers: seed.teachers.len(),
        admins: seed.admins.len(),
        schools: seed.schools.len(),
        subjects: seed.subjects.len(),
        vacancies: seed.vacancies.len(),
        reciprocal_matches: seed.reciprocal_matches.len(),
        top_matches: seed.top_matches.len(),
    }))
}
