use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::session::{Role, TeacherIdentity};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub nic: String,
    pub birth_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub nic: String,
    pub name: String,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubjectSelectionRequest {
    pub subjects: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Teacher credential check: parameterized NIC + birth-date lookup.
/// Zero rows is a 401, never an error; connectivity failures surface as a
/// generic unavailable signal.
pub async fn teacher_login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<LoginResponse>>, ApiError> {
    let teacher = state
        .db
        .find_teacher(&req.nic, &req.birth_date)
        .map_err(|e| {
            tracing::warn!(error = %e, "Teacher credential lookup failed");
            ApiError::unavailable("Login is temporarily unavailable")
        })?
        .ok_or_else(|| ApiError::unauthorized("Invalid NIC or birth date"))?;

    let session = state
        .sessions
        .create(
            Role::Teacher,
            &teacher.nic,
            &teacher.name,
            teacher.title.as_deref(),
        )
        .await;

    tracing::info!(nic = %teacher.nic, "Teacher logged in");

    Ok(JSend::success(LoginResponse {
        token: session.token,
        role: Role::Teacher,
        nic: teacher.nic,
        name: teacher.name,
        title: teacher.title,
    }))
}

/// Administrator credential check against the admin table.
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<LoginResponse>>, ApiError> {
    let admin = state
        .db
        .find_admin(&req.nic, &req.birth_date)
        .map_err(|e| {
            tracing::warn!(error = %e, "Admin credential lookup failed");
            ApiError::unavailable("Login is temporarily unavailable")
        })?
        .ok_or_else(|| ApiError::unauthorized("Invalid NIC or birth date"))?;

    let session = state
        .sessions
        .create(Role::Admin, &admin.nic, &admin.name, admin.title.as_deref())
        .await;

    tracing::info!(nic = %admin.nic, "Admin logged in");

    Ok(JSend::success(LoginResponse {
        token: session.token,
        role: Role::Admin,
        nic: admin.nic,
        name: admin.name,
        title: admin.title,
    }))
}

/// Cache the teacher's current subject selection on the session.
pub async fn set_session_subjects(
    State(state): State<Arc<AppState>>,
    identity: TeacherIdentity,
    AppJson(req): AppJson<SubjectSelectionRequest>,
) -> Result<Json<JSend<()>>, ApiError> {
    if !state
        .sessions
        .set_subjects(&identity.0.token, req.subjects)
        .await
    {
        return Err(ApiError::unauthorized("Not logged in"));
    }

    Ok(JSend::success(()))
}
