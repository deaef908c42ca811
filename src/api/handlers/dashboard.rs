use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::warehouse_error;
use crate::api::response::{ApiError, JSend};
use crate::session::AdminIdentity;
use crate::storage::models::EligibilityKpis;
use crate::AppState;

/// Eligible / non-eligible counts plus per-division counts. Three
/// independent aggregates over static reference data; recomputed on every
/// dashboard refresh.
pub async fn dashboard_kpis(
    State(state): State<Arc<AppState>>,
    _identity: AdminIdentity,
) -> Result<Json<JSend<EligibilityKpis>>, ApiError> {
    let kpis = state.db.eligibility_kpis().map_err(warehouse_error)?;
    Ok(JSend::success(kpis))
}
