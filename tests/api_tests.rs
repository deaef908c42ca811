use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use transfer_portal::config::{Config, GeocodingConfig, ServerConfig, StorageBackend, StorageConfig};
use transfer_portal::geocode::{GeocodeError, Geocoder};
use transfer_portal::object_store::LocalStore;
use transfer_portal::session::SessionStore;
use transfer_portal::storage::models::*;
use transfer_portal::storage::Database;
use transfer_portal::submission::month_stamp;
use transfer_portal::AppState;

// ============================================================================
// Test scaffolding
// ============================================================================

/// Geocoder stub: `Some(_)` plays a confirmed service response, `None`
/// plays a non-OK status.
struct StubGeocoder {
    normalized: Option<String>,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, _address: &str) -> Result<Option<String>, GeocodeError> {
        Ok(self.normalized.clone())
    }
}

fn test_state(temp_dir: &tempfile::TempDir, geocoder: StubGeocoder) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let bronze_dir = temp_dir.path().join("bronze");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
            reference_seed_file: None,
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_storage_path: bronze_dir.to_string_lossy().to_string(),
            azure_account: None,
            azure_key: None,
            bronze_container: None,
            bronze_folder: "vacancy-details".to_string(),
        },
        geocoding: GeocodingConfig {
            enabled: true,
            endpoint: "http://geocode.invalid".to_string(),
            api_key: Some("test-key".to_string()),
        },
        test_mode: true,
        max_body_size: 1024 * 1024,
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    db.replace_reference(&sample_seed())
        .expect("Failed to seed reference tables");
    let object_store = LocalStore::new(&bronze_dir).expect("Failed to create test object store");

    Arc::new(AppState {
        config,
        db,
        geocoder: Arc::new(geocoder),
        object_store: Arc::new(object_store),
        sessions: SessionStore::new(),
    })
}

fn sample_seed() -> ReferenceSeed {
    ReferenceSeed {
        teachers: vec![
            TeacherRecord {
                nic: "900123456V".to_string(),
                birth_date: "1990-01-23".to_string(),
                name: "A. Perera".to_string(),
                title: Some("Teacher".to_string()),
            },
            TeacherRecord {
                nic: "12-345/678 X".to_string(),
                birth_date: "1980-05-05".to_string(),
                name: "F. Gunawardena".to_string(),
                title: None,
            },
        ],
        admins: vec![AdminRecord {
            nic: "700000001V".to_string(),
            birth_date: "1970-01-01".to_string(),
            name: "C. Fernando".to_string(),
            title: Some("Director".to_string()),
        }],
        schools: vec![
            SchoolRecord {
                name: "Central College".to_string(),
                section: Some("Secondary".to_string()),
            },
            SchoolRecord {
                name: "Hill Primary".to_string(),
                section: Some("Primary".to_string()),
            },
        ],
        subjects: vec![
            SubjectRecord {
                section: "Primary".to_string(),
                subject: "Mathematics".to_string(),
            },
            SubjectRecord {
                section: "Secondary".to_string(),
                subject: "Physics".to_string(),
            },
        ],
        vacancies: vec![
            VacancyRecord {
                nic: "900123456V".to_string(),
                teacher_name: "A. Perera".to_string(),
                eligible: true,
                division: "Western".to_string(),
            },
            VacancyRecord {
                nic: "851234567V".to_string(),
                teacher_name: "B. Silva".to_string(),
                eligible: false,
                division: "Central".to_string(),
            },
        ],
        reciprocal_matches: vec![
            ReciprocalMatchRecord {
                teacher_a_nic: "900123456V".to_string(),
                teacher_a_name: "A. Perera".to_string(),
                teacher_a_eligible: true,
                teacher_b_nic: "751111111V".to_string(),
                teacher_b_name: "D. Jayasuriya".to_string(),
                teacher_b_eligible: true,
            },
            ReciprocalMatchRecord {
                teacher_a_nic: "851234567V".to_string(),
                teacher_a_name: "B. Silva".to_string(),
                teacher_a_eligible: false,
                teacher_b_nic: "900123456V".to_string(),
                teacher_b_name: "A. Perera".to_string(),
                teacher_b_eligible: true,
            },
        ],
        top_matches: vec![TopMatchRecord {
            teacher_nic: "900123456V".to_string(),
            teacher_eligible: true,
            candidate_nic: "751111111V".to_string(),
            candidate_name: "D. Jayasuriya".to_string(),
            candidate_eligible: true,
            rank: 1,
        }],
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::String(
        String::from_utf8_lossy(&bytes).to_string(),
    ));
    (status, json)
}

async fn login(app: &Router, path: &str, nic: &str, birth_date: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        path,
        None,
        Some(json!({ "nic": nic, "birth_date": birth_date })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

fn valid_form() -> Value {
    json!({
        "sections": ["Secondary"],
        "subjects": ["Physics"],
        "address": "12 Lake Road, Colombo",
        "school_preferences": ["Central College", "Hill Primary"],
        "reasons": ["Family"]
    })
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let (status, body) = send(&app, "GET", "/_internal/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_teacher_login_rejects_bad_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    // Unknown NIC
    let (status, body) = send(
        &app,
        "POST",
        "/auth/teacher/login",
        None,
        Some(json!({ "nic": "nobody", "birth_date": "1990-01-23" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["message"], "Invalid NIC or birth date");

    // Known NIC, wrong birth date
    let (status, _) = send(
        &app,
        "POST",
        "/auth/teacher/login",
        None,
        Some(json!({ "nic": "900123456V", "birth_date": "1990-01-24" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_teacher_login_returns_public_fields() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let (status, body) = send(
        &app,
        "POST",
        "/auth/teacher/login",
        None,
        Some(json!({ "nic": "900123456V", "birth_date": "1990-01-23" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "A. Perera");
    assert_eq!(body["data"]["nic"], "900123456V");
    assert_eq!(body["data"]["role"], "teacher");
    assert!(body["data"]["token"].as_str().is_some());
}

#[tokio::test]
async fn test_admin_routes_require_admin_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    // No token
    let (status, _) = send(&app, "GET", "/dashboard/kpis", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Teacher token on an admin route
    let teacher = login(&app, "/auth/teacher/login", "900123456V", "1990-01-23").await;
    let (status, _) = send(&app, "GET", "/dashboard/kpis", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin token
    let admin = login(&app, "/auth/admin/login", "700000001V", "1970-01-01").await;
    let (status, body) = send(&app, "GET", "/dashboard/kpis", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["eligible"], 1);
    assert_eq!(body["data"]["not_eligible"], 1);
}

#[tokio::test]
async fn test_session_subject_selection() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let teacher = login(&app, "/auth/teacher/login", "900123456V", "1990-01-23").await;
    let (status, _) = send(
        &app,
        "PUT",
        "/session/subjects",
        Some(&teacher),
        Some(json!({ "subjects": ["Physics", "Chemistry"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Reference data
// ============================================================================

#[tokio::test]
async fn test_reference_lists() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let (status, body) = send(&app, "GET", "/reference/schools", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["schools"],
        json!(["Central College", "Hill Primary"])
    );

    let (status, body) = send(
        &app,
        "GET",
        "/reference/subjects?sections=Secondary",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let subjects = body["data"]["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["subject"], "Physics");
}

#[tokio::test]
async fn test_match_filtering() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));
    let admin = login(&app, "/auth/admin/login", "700000001V", "1970-01-01").await;

    // Both sides eligible
    let (status, body) = send(
        &app,
        "GET",
        "/reference/matches/reciprocal?eligibility=eligible",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let matches = body["data"]["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["teacher_a_nic"], "900123456V");

    // Side A not eligible, side B eligible
    let (_, body) = send(
        &app,
        "GET",
        "/reference/matches/reciprocal?eligibility=not-eligible",
        Some(&admin),
        None,
    )
    .await;
    let matches = body["data"]["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["teacher_a_nic"], "851234567V");

    // Per-teacher filter
    let (_, body) = send(
        &app,
        "GET",
        "/reference/matches/top?nic=900123456V",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["data"]["matches"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        "GET",
        "/reference/matches/top?nic=unknown",
        Some(&admin),
        None,
    )
    .await;
    assert!(body["data"]["matches"].as_array().unwrap().is_empty());
}

// ============================================================================
// Submission gate
// ============================================================================

fn bronze_files(dir: &tempfile::TempDir) -> Vec<String> {
    let folder = dir.path().join("bronze").join("vacancy-details");
    if !folder.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_submission_accepted_once_per_month() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(
        &dir,
        StubGeocoder {
            normalized: Some("12 Lake Rd, Colombo 00300, Sri Lanka".to_string()),
        },
    );
    let app = transfer_portal::api::create_router(state);

    let teacher = login(&app, "/auth/teacher/login", "12-345/678 X", "1980-05-05").await;

    // First submission succeeds and lands at the sanitized key
    let (status, body) = send(&app, "POST", "/submissions", Some(&teacher), Some(valid_form())).await;
    assert_eq!(status, StatusCode::OK, "submission failed: {body}");
    let month = month_stamp(chrono::Utc::now());
    assert_eq!(
        body["data"]["object_key"],
        format!("vacancy-details/12-345_678_X_{month}.csv")
    );
    // The stored address is the geocoder's normalized form
    assert_eq!(
        body["data"]["address"],
        "12 Lake Rd, Colombo 00300, Sri Lanka"
    );
    assert_eq!(bronze_files(&dir).len(), 1);

    // Second submission the same month is rejected, regardless of fields
    let mut other = valid_form();
    other["reasons"] = json!(["Health"]);
    let (status, body) = send(&app, "POST", "/submissions", Some(&teacher), Some(other)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already submitted"));

    // No second object was created
    assert_eq!(bronze_files(&dir).len(), 1);
}

#[tokio::test]
async fn test_submission_rejects_invalid_address() {
    let dir = tempfile::tempdir().unwrap();
    // Geocoder answers with a non-OK status
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let teacher = login(&app, "/auth/teacher/login", "900123456V", "1990-01-23").await;
    let (status, body) = send(&app, "POST", "/submissions", Some(&teacher), Some(valid_form())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("valid address"));

    // Nothing was written
    assert!(bronze_files(&dir).is_empty());
}

#[tokio::test]
async fn test_submission_validation_messages() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(
        &dir,
        StubGeocoder {
            normalized: Some("anywhere".to_string()),
        },
    ));
    let teacher = login(&app, "/auth/teacher/login", "900123456V", "1990-01-23").await;

    // Missing required fields
    let mut form = valid_form();
    form["subjects"] = json!([]);
    let (status, body) = send(&app, "POST", "/submissions", Some(&teacher), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("required fields"));

    // No school selected
    let mut form = valid_form();
    form["school_preferences"] = json!([]);
    let (status, body) = send(&app, "POST", "/submissions", Some(&teacher), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("at least one school"));

    // Duplicate schools
    let mut form = valid_form();
    form["school_preferences"] = json!(["Central College", "Central College"]);
    let (status, body) = send(&app, "POST", "/submissions", Some(&teacher), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("Duplicate schools"));

    assert!(bronze_files(&dir).is_empty());
}

#[tokio::test]
async fn test_submission_requires_teacher_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let (status, _) = send(&app, "POST", "/submissions", None, Some(valid_form())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = login(&app, "/auth/admin/login", "700000001V", "1970-01-01").await;
    let (status, _) = send(&app, "POST", "/submissions", Some(&admin), Some(valid_form())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Export & import
// ============================================================================

#[tokio::test]
async fn test_export_vacancies_download() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));
    let admin = login(&app, "/auth/admin/login", "700000001V", "1970-01-01").await;

    let request = Request::builder()
        .method("GET")
        .uri("/export/vacancies")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("vacancy-details.csv"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let table = transfer_portal::export::Table::from_csv(&bytes).unwrap();
    assert_eq!(
        table.columns,
        vec!["NIC", "Teacher_Name", "Eligible", "Division"]
    );
    assert_eq!(table.rows.len(), 2);
}

#[tokio::test]
async fn test_import_reference_replaces_tables() {
    let dir = tempfile::tempdir().unwrap();
    let app = transfer_portal::api::create_router(test_state(&dir, StubGeocoder { normalized: None }));

    let seed = json!({
        "teachers": [{
            "nic": "600000000V",
            "birth_date": "1960-06-06",
            "name": "E. Weerasinghe",
            "title": null
        }]
    });
    let (status, body) = send(&app, "POST", "/admin/reference/import", None, Some(seed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["teachers"], 1);

    // New credentials work, old ones do not
    login(&app, "/auth/teacher/login", "600000000V", "1960-06-06").await;
    let (status, _) = send(
        &app,
        "POST",
        "/auth/teacher/login",
        None,
        Some(json!({ "nic": "900123456V", "birth_date": "1990-01-23" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
