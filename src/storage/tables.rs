use redb::TableDefinition;

/// Teacher credentials: NIC -> TeacherRecord (msgpack)
pub const TEACHERS: TableDefinition<&str, &[u8]> = TableDefinition::new("teachers");

/// Admin credentials: NIC -> AdminRecord (msgpack)
pub const ADMINS: TableDefinition<&str, &[u8]> = TableDefinition::new("admins");

/// School list: school name -> SchoolRecord (msgpack)
pub const SCHOOLS: TableDefinition<&str, &[u8]> = TableDefinition::new("schools");

/// Subject list: "section/subject" -> SubjectRecord (msgpack)
pub const SUBJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("subjects");

/// Vacancy table: NIC -> VacancyRecord (msgpack)
pub const VACANCIES: TableDefinition<&str, &[u8]> = TableDefinition::new("vacancies");

/// Reciprocal matches: "nic_a:nic_b" -> ReciprocalMatchRecord (msgpack)
pub const RECIPROCAL_MATCHES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("reciprocal_matches");

/// Top-N candidate matches: "teacher_nic:rank:candidate_nic" -> TopMatchRecord (msgpack)
pub const TOP_MATCHES: TableDefinition<&str, &[u8]> = TableDefinition::new("top_matches");
