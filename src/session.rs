//! Per-session identity: who is logged in, plus transient form selections.
//!
//! Sessions are bearer tokens issued at login and held in process memory;
//! they live until the process restarts. Handlers receive identity through
//! the [`TeacherIdentity`]/[`AdminIdentity`] extractors rather than ambient
//! state, so they stay testable in isolation.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::response::ApiError;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub nic: String,
    pub name: String,
    pub title: Option<String>,
    /// Subjects the teacher currently has selected in the form.
    pub subjects: Vec<String>,
}

/// In-process token -> session map.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new session for an authenticated identity.
    pub async fn create(
        &self,
        role: Role,
        nic: &str,
        name: &str,
        title: Option<&str>,
    ) -> Session {
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            role,
            nic: nic.to_string(),
            name: name.to_string(),
            title: title.map(|t| t.to_string()),
            subjects: Vec::new(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(token).cloned()
    }

    /// Cache the teacher's current subject selection. Returns false when
    /// the token is unknown.
    pub async fn set_subjects(&self, token: &str, subjects: Vec<String>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token) {
            Some(session) => {
                session.subjects = subjects;
                true
            }
            None => false,
        }
    }
}

/// A logged-in teacher, extracted from the `Authorization: Bearer` header.
pub struct TeacherIdentity(pub Session);

/// A logged-in administrator, extracted from the `Authorization: Bearer` header.
pub struct AdminIdentity(pub Session);

async fn session_from_parts(
    parts: &Parts,
    state: &Arc<AppState>,
) -> Result<Session, ApiError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Not logged in"))?;

    state
        .sessions
        .get(token)
        .await
        .ok_or_else(|| ApiError::unauthorized("Not logged in"))
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for TeacherIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let session = session_from_parts(parts, state).await?;
        if session.role != Role::Teacher {
            return Err(ApiError::forbidden("Teacher session required"));
        }
        Ok(TeacherIdentity(session))
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let session = session_from_parts(parts, state).await?;
        if session.role != Role::Admin {
            return Err(ApiError::forbidden("Admin session required"));
        }
        Ok(AdminIdentity(session))
    }
}
