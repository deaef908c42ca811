use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::warehouse_error;
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::session::AdminIdentity;
use crate::storage::models::{ReciprocalMatchRecord, SubjectRecord, TopMatchRecord, VacancyRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SchoolsResponse {
    pub schools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectsParams {
    /// Comma-separated section filter, e.g. `sections=Primary,Secondary`
    #[serde(default)]
    pub sections: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<SubjectRecord>,
}

#[derive(Debug, Deserialize)]
pub struct VacancyParams {
    #[serde(default)]
    pub eligible: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct VacanciesResponse {
    pub vacancies: Vec<VacancyRecord>,
}

/// Match-table eligibility filter. `Eligible` keeps rows where both sides
/// are eligible; `NotEligible` keeps rows where the requesting side is not
/// eligible but the counterpart is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityFilter {
    Eligible,
    NotEligible,
}

#[derive(Debug, Deserialize)]
pub struct MatchParams {
    #[serde(default)]
    pub nic: Option<String>,
    #[serde(default)]
    pub eligibility: Option<EligibilityFilter>,
}

#[derive(Debug, Serialize)]
pub struct ReciprocalMatchesResponse {
    pub matches: Vec<ReciprocalMatchRecord>,
}

#[derive(Debug, Serialize)]
pub struct TopMatchesResponse {
    pub matches: Vec<TopMatchRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Distinct school names for the preference selectors.
pub async fn list_schools(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<SchoolsResponse>>, ApiError> {
    let schools = state.db.school_names().map_err(warehouse_error)?;
    Ok(JSend::success(SchoolsResponse { schools }))
}

/// (section, subject) pairs, optionally filtered by a section list.
pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SubjectsParams>,
) -> Result<Json<JSend<SubjectsResponse>>, ApiError> {
    let sections: Option<Vec<String>> = params.sections.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    });

    let subjects = state
        .db
        .subjects(sections.as_deref())
        .map_err(warehouse_error)?;

    Ok(JSend::success(SubjectsResponse { subjects }))
}

/// The full vacancy table, optionally filtered by eligibility.
pub async fn list_vacancies(
    State(state): State<Arc<AppState>>,
    _identity: AdminIdentity,
    AppQuery(params): AppQuery<VacancyParams>,
) -> Result<Json<JSend<VacanciesResponse>>, ApiError> {
    let vacancies = state
        .db
        .vacancies(params.eligible)
        .map_err(warehouse_error)?;

    Ok(JSend::success(VacanciesResponse { vacancies }))
}

/// Reciprocal match pairs, filterable per teacher and eligibility.
pub async fn list_reciprocal_matches(
    State(state): State<Arc<AppState>>,
    _identity: AdminIdentity,
    AppQuery(params): AppQuery<MatchParams>,
) -> Result<Json<JSend<ReciprocalMatchesResponse>>, ApiError> {
    let all = state.db.reciprocal_matches().map_err(warehouse_error)?;
    let matches = filter_reciprocal(all, params.nic.as_deref(), params.eligibility);
    Ok(JSend::success(ReciprocalMatchesResponse { matches }))
}

/// Top-N candidate matches, filterable per teacher and eligibility.
pub async fn list_top_matches(
    State(state): State<Arc<AppState>>,
    _identity: AdminIdentity,
    AppQuery(params): AppQuery<MatchParams>,
) -> Result<Json<JSend<TopMatchesResponse>>, ApiError> {
    let all = state.db.top_matches().map_err(warehouse_error)?;
    let matches = filter_top(all, params.nic.as_deref(), params.eligibility);
    Ok(JSend::success(TopMatchesResponse { matches }))
}

// ============================================================================
// Helpers
// ============================================================================

pub(super) fn filter_reciprocal(
    rows: Vec<ReciprocalMatchRecord>,
    nic: Option<&str>,
    eligibility: Option<EligibilityFilter>,
) -> Vec<ReciprocalMatchRecord> {
    rows.into_iter()
        .filter(|row| match eligibility {
            Some(EligibilityFilter::Eligible) => row.teacher_a_eligible && row.teacher_b_eligible,
            Some(EligibilityFilter::NotEligible) => {
                !row.teacher_a_eligible && row.teacher_b_eligible
            }
            None => true,
        })
        .filter(|row| nic.map_or(true, |n| row.teacher_a_nic == n))
        .collect()
}

pub(super) fn filter_top(
    rows: Vec<TopMatchRecord>,
    nic: Option<&str>,
    eligibility: Option<EligibilityFilter>,
) -> Vec<TopMatchRecord> {
    rows.into_iter()
        .filter(|row| match eligibility {
            Some(EligibilityFilter::Eligible) => row.teacher_eligible && row.candidate_eligible,
            Some(EligibilityFilter::NotEligible) => {
                !row.teacher_eligible && row.candidate_eligible
            }
            None => true,
        })
        .filter(|row| nic.map_or(true, |n| row.teacher_nic == n))
        .collect()
}
