//! transfer-portal - A two-role web portal API for teacher transfer preferences
//!
//! This crate backs a teacher transfer portal with:
//! - NIC + birth-date credential checks against an embedded reference database (redb)
//! - One-submission-per-month preference forms written to a bronze object-storage path
//! - Swappable object storage backends (local filesystem, Azure Blob)
//! - Geocode-validated addresses via an external geocoding service
//! - Eligibility/matching dashboards with tabular export

pub mod api;
pub mod config;
pub mod export;
pub mod geocode;
pub mod object_store;
pub mod session;
pub mod storage;
pub mod submission;

use std::sync::Arc;

use config::Config;
use session::SessionStore;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub geocoder: Arc<dyn geocode::Geocoder>,
    pub object_store: Arc<dyn object_store::ObjectStore>,
    pub sessions: SessionStore,
}
