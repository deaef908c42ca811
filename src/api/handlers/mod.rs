mod admin;
mod auth;
mod dashboard;
mod export;
mod reference;
mod submissions;

use crate::api::response::ApiError;
use crate::storage::DatabaseError;
use crate::submission::SubmissionError;

pub use admin::{health, import_reference};
pub use auth::{admin_login, set_session_subjects, teacher_login};
pub use dashboard::dashboard_kpis;
pub use export::{export_matches, export_vacancies};
pub use reference::{list_reciprocal_matches, list_schools, list_subjects, list_top_matches, list_vacancies};
pub use submissions::create_submission;

/// Map a reference-data query failure to the generic unavailable signal.
/// The caller gets a message and an empty view; the process keeps serving.
fn warehouse_error(e: DatabaseError) -> ApiError {
    tracing::warn!(error = %e, "Reference data query failed");
    ApiError::unavailable("Reference data is temporarily unavailable")
}

/// Map a submission gate rejection to its JSend response.
fn submission_error(e: SubmissionError) -> ApiError {
    match e {
        SubmissionError::AlreadySubmitted => ApiError::conflict(e.to_string()),
        _ => ApiError::bad_request(e.to_string()),
    }
}
