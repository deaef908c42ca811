//! The monthly submission gate: field validation, key derivation, and the
//! one-row bronze record encoding.

use std::collections::HashSet;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on ordered school preferences per submission.
pub const MAX_SCHOOL_PREFERENCES: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum SubmissionError {
    #[error("Please fill all required fields before submitting")]
    MissingFields,
    #[error("Please select at least one school")]
    NoSchoolSelected,
    #[error("At most {MAX_SCHOOL_PREFERENCES} school preferences are allowed")]
    TooManySchools,
    #[error("Duplicate schools selected. Each preference must be unique")]
    DuplicateSchools,
    #[error("Address could not be verified. Please enter a valid address")]
    InvalidAddress,
    #[error("You have already submitted this month. Duplicate submissions are not allowed")]
    AlreadySubmitted,
}

/// A teacher's transfer-preference form as received from the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionForm {
    pub sections: Vec<String>,
    pub subjects: Vec<String>,
    pub address: String,
    pub school_preferences: Vec<String>,
    pub reasons: Vec<String>,
}

impl SubmissionForm {
    /// Field validation, in contract order: required fields, then at least
    /// one school, then the preference cap, then duplicate detection. The
    /// address gate (geocoding) and the dedup gate run afterwards in the
    /// handler because they touch external services.
    pub fn validate_fields(&self) -> Result<(), SubmissionError> {
        if self.sections.is_empty()
            || self.subjects.is_empty()
            || self.address.trim().is_empty()
            || self.reasons.is_empty()
        {
            return Err(SubmissionError::MissingFields);
        }

        if self.school_preferences.is_empty() {
            return Err(SubmissionError::NoSchoolSelected);
        }

        if self.school_preferences.len() > MAX_SCHOOL_PREFERENCES {
            return Err(SubmissionError::TooManySchools);
        }

        let distinct: HashSet<&str> = self
            .school_preferences
            .iter()
            .map(String::as_str)
            .collect();
        if distinct.len() != self.school_preferences.len() {
            return Err(SubmissionError::DuplicateSchools);
        }

        Ok(())
    }
}

/// The flattened one-row record written to the bronze path. Column names
/// follow the warehouse ingestion contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "NIC")]
    pub nic: String,
    #[serde(rename = "Teacher_Name")]
    pub teacher_name: String,
    #[serde(rename = "Sections")]
    pub sections: String,
    #[serde(rename = "Subjects")]
    pub subjects: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "School_Preferences")]
    pub school_preferences: String,
    #[serde(rename = "Reason")]
    pub reasons: String,
    #[serde(rename = "Submitted_At")]
    pub submitted_at: String,
}

impl SubmissionRecord {
    /// Flatten a validated form. List fields are comma-joined; `address`
    /// must already be the geocode-normalized form where geocoding is on.
    pub fn from_form(
        nic: &str,
        teacher_name: &str,
        form: &SubmissionForm,
        address: &str,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            nic: nic.to_string(),
            teacher_name: teacher_name.to_string(),
            sections: form.sections.join(","),
            subjects: form.subjects.join(","),
            address: address.to_string(),
            school_preferences: form.school_preferences.join(","),
            reasons: form.reasons.join(","),
            submitted_at: submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Encode as a single-row tabular object: header row + one data row.
    pub fn encode(&self) -> Result<Bytes, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(self)?;
        let data = writer
            .into_inner()
            .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;
        Ok(Bytes::from(data))
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_` so the NIC is
/// safe to embed in an object key.
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `YYYYMM` stamp for the dedup key.
pub fn month_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m").to_string()
}

/// Deterministic bronze object key for one (NIC, month) pair:
/// `<folder>/<sanitized-nic>_<YYYYMM>.csv`.
pub fn object_key(folder: &str, nic: &str, month: &str) -> String {
    format!("{}/{}_{}.csv", folder, sanitize_identifier(nic), month)
}
