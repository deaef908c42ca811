use serde::{Deserialize, Serialize};

/// A teacher credential row. Read-only reference data; the secret is the
/// birth date in `YYYY-MM-DD` text form, matched exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherRecord {
    pub nic: String,
    pub birth_date: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// An administrator credential row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRecord {
    pub nic: String,
    pub birth_date: String,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolRecord {
    pub name: String,
    #[serde(default)]
    pub section: Option<String>,
}

/// A (section, subject) pair used to filter subject choices by section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub section: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub nic: String,
    pub teacher_name: String,
    pub eligible: bool,
    pub division: String,
}

/// A reciprocal transfer pair with the eligibility flag of each side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReciprocalMatchRecord {
    pub teacher_a_nic: String,
    pub teacher_a_name: String,
    pub teacher_a_eligible: bool,
    pub teacher_b_nic: String,
    pub teacher_b_name: String,
    pub teacher_b_eligible: bool,
}

/// One ranked candidate from the top-N match table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopMatchRecord {
    pub teacher_nic: String,
    pub teacher_eligible: bool,
    pub candidate_nic: String,
    pub candidate_name: String,
    pub candidate_eligible: bool,
    pub rank: u32,
}

/// Per-division teacher count for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionCount {
    pub division: String,
    pub teachers: u64,
}

/// The three independent dashboard aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityKpis {
    pub eligible: u64,
    pub not_eligible: u64,
    pub divisions: Vec<DivisionCount>,
}

/// Full reference-table payload, loaded out-of-band (startup seed file or
/// test-mode import). The serving paths never write these tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSeed {
    #[serde(default)]
    pub teachers: Vec<TeacherRecord>,
    #[serde(default)]
    pub admins: Vec<AdminRecord>,
    #[serde(default)]
    pub schools: Vec<SchoolRecord>,
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
    #[serde(default)]
    pub vacancies: Vec<VacancyRecord>,
    #[serde(default)]
    pub reciprocal_matches: Vec<ReciprocalMatchRecord>,
    #[serde(default)]
    pub top_matches: Vec<TopMatchRecord>,
}
