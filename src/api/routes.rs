use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_size as usize;

    let mut router = Router::new()
        // Credential checks
        .route("/auth/teacher/login", post(handlers::teacher_login))
        .route("/auth/admin/login", post(handlers::admin_login))
        .route("/session/subjects", put(handlers::set_session_subjects))
        // Reference data
        .route("/reference/schools", get(handlers::list_schools))
        .route("/reference/subjects", get(handlers::list_subjects))
        .route("/reference/vacancies", get(handlers::list_vacancies))
        .route(
            "/reference/matches/reciprocal",
            get(handlers::list_reciprocal_matches),
        )
        .route("/reference/matches/top", get(handlers::list_top_matches))
        // Submissions (bronze path)
        .route("/submissions", post(handlers::create_submission))
        // Dashboard
        .route("/dashboard/kpis", get(handlers::dashboard_kpis))
        .route("/export/vacancies", get(handlers::export_vacancies))
        .route("/export/matches", get(handlers::export_matches))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — reference import route is available.");
        router = router.route("/admin/reference/import", post(handlers::import_reference));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
