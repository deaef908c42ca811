use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::submission_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::object_store::ObjectStoreError;
use crate::session::TeacherIdentity;
use crate::submission::{month_stamp, object_key, SubmissionError, SubmissionForm, SubmissionRecord};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    /// Bronze object key the record was written to.
    pub object_key: String,
    /// Geocode-normalized address as stored.
    pub address: String,
    pub submitted_at: String,
}

/// The monthly submission gate.
///
/// Validation order is part of the contract: required fields, school
/// gates, geocode gate, then the (NIC, month) dedup check against the
/// bronze path. The write itself is a conditional create, so a race
/// between two concurrent submissions still yields exactly one object.
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    identity: TeacherIdentity,
    AppJson(form): AppJson<SubmissionForm>,
) -> Result<Json<JSend<SubmissionResponse>>, ApiError> {
    form.validate_fields().map_err(submission_error)?;

    // Address gate: only a confirmed geocode passes, and the normalized
    // formatted address replaces the raw input in the stored record.
    let address = match state.geocoder.resolve(&form.address).await {
        Ok(Some(formatted)) => formatted,
        Ok(None) => return Err(submission_error(SubmissionError::InvalidAddress)),
        Err(e) => {
            tracing::warn!(error = %e, "Geocoding call failed");
            return Err(ApiError::unavailable(
                "Address verification is temporarily unavailable",
            ));
        }
    };

    let now = Utc::now();
    let key = object_key(
        &state.config.storage.bronze_folder,
        &identity.0.nic,
        &month_stamp(now),
    );

    // Friendly fast path; put_if_absent below is the authoritative arbiter.
    let already = state.object_store.exists(&key).await.map_err(|e| {
        tracing::warn!(error = %e, "Submission existence check failed");
        ApiError::unavailable("Submission storage is temporarily unavailable")
    })?;
    if already {
        return Err(submission_error(SubmissionError::AlreadySubmitted));
    }

    let record = SubmissionRecord::from_form(
        &identity.0.nic,
        &identity.0.name,
        &form,
        &address,
        now,
    );
    let data = record
        .encode()
        .map_err(|e| ApiError::internal(format!("Failed to encode submission: {e}")))?;

    match state.object_store.put_if_absent(&key, data).await {
        Ok(()) => {}
        Err(ObjectStoreError::AlreadyExists(_)) => {
            return Err(submission_error(SubmissionError::AlreadySubmitted));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Submission write failed");
            return Err(ApiError::unavailable(
                "Submission storage is temporarily unavailable",
            ));
        }
    }

    tracing::info!(nic = %identity.0.nic, object_key = %key, "Submission stored");

    Ok(JSend::success(SubmissionResponse {
        object_key: key,
        address: record.address,
        submitted_at: record.submitted_at,
    }))
}
