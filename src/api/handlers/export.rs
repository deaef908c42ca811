use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

use super::reference::{filter_reciprocal, filter_top, EligibilityFilter, VacancyParams};
use super::warehouse_error;
use crate::api::response::{ApiError, AppQuery};
use crate::export::Table;
use crate::session::AdminIdentity;
use crate::storage::models::{ReciprocalMatchRecord, TopMatchRecord, VacancyRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Reciprocal,
    Top,
}

#[derive(Debug, Deserialize)]
pub struct ExportMatchesParams {
    pub kind: MatchKind,
    #[serde(default)]
    pub nic: Option<String>,
    #[serde(default)]
    pub eligibility: Option<EligibilityFilter>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Download the (optionally filtered) vacancy table as a byte stream.
pub async fn export_vacancies(
    State(state): State<Arc<AppState>>,
    _identity: AdminIdentity,
    AppQuery(params): AppQuery<VacancyParams>,
) -> Result<Response, ApiError> {
    let vacancies = state
        .db
        .vacancies(params.eligible)
        .map_err(warehouse_error)?;

    csv_download("vacancy-details.csv", &vacancy_table(&vacancies))
}

/// Download one of the match tables, same filters as the list views.
pub async fn export_matches(
    State(state): State<Arc<AppState>>,
    _identity: AdminIdentity,
    AppQuery(params): AppQuery<ExportMatchesParams>,
) -> Result<Response, ApiError> {
    let table = match params.kind {
        MatchKind::Reciprocal => {
            let all = state.db.reciprocal_matches().map_err(warehouse_error)?;
            reciprocal_table(&filter_reciprocal(
                all,
                params.nic.as_deref(),
                params.eligibility,
            ))
        }
        MatchKind::Top => {
            let all = state.db.top_matches().map_err(warehouse_error)?;
            top_table(&filter_top(all, params.nic.as_deref(), params.eligibility))
        }
    };

    csv_download("matches.csv", &table)
}

// ============================================================================
// Helpers
// ============================================================================

fn vacancy_table(rows: &[VacancyRecord]) -> Table {
    let mut table = Table::new(["NIC", "Teacher_Name", "Eligible", "Division"]);
    for row in rows {
        table.push_row([
            row.nic.clone(),
            row.teacher_name.clone(),
            row.eligible.to_string(),
            row.division.clone(),
        ]);
    }
    table
}

fn reciprocal_table(rows: &[ReciprocalMatchRecord]) -> Table {
    let mut table = Table::new([
        "TeacherA_NIC",
        "TeacherA_Name",
        "TeacherA_Eligible",
        "TeacherB_NIC",
        "TeacherB_Name",
        "TeacherB_Eligible",
    ]);
    for row in rows {
        table.push_row([
            row.teacher_a_nic.clone(),
            row.teacher_a_name.clone(),
            row.teacher_a_eligible.to_string(),
            row.teacher_b_nic.clone(),
            row.teacher_b_name.clone(),
            row.teacher_b_eligible.to_string(),
        ]);
    }
    table
}

fn top_table(rows: &[TopMatchRecord]) -> Table {
    let mut table = Table::new([
        "Teacher_NIC",
        "Teacher_Eligible",
        "Candidate_NIC",
        "Candidate_Name",
        "Candidate_Eligible",
        "Rank",
    ]);
    for row in rows {
        table.push_row([
            row.teacher_nic.clone(),
            row.teacher_eligible.to_string(),
            row.candidate_nic.clone(),
            row.candidate_name.clone(),
            row.candidate_eligible.to_string(),
            row.rank.to_string(),
        ]);
    }
    table
}

/// Build a download response: encoded table body plus attachment headers.
fn csv_download(filename: &str, table: &Table) -> Result<Response, ApiError> {
    let data = table
        .to_csv()
        .map_err(|e| ApiError::internal(format!("Failed to encode export: {e}")))?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/csv; charset=utf-8"),
    );

    if let Ok(value) = format!("attachment; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
