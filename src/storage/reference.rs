use std::collections::BTreeMap;
use std::path::Path;

use redb::{ReadableTable, TableDefinition, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::models::*;
use super::tables::*;

impl Database {
    // ========================================================================
    // Credential lookups
    // ========================================================================

    /// Point lookup of a teacher by NIC and exact birth-date text.
    /// Returns `None` on zero rows; never errors for a missing record.
    pub fn find_teacher(
        &self,
        nic: &str,
        birth_date: &str,
    ) -> Result<Option<TeacherRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(TEACHERS)?;

        match table.get(nic)? {
            Some(data) => {
                let teacher: TeacherRecord = rmp_serde::from_slice(data.value())?;
                if teacher.birth_date == birth_date {
                    Ok(Some(teacher))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Point lookup of an administrator by NIC and exact birth-date text.
    pub fn find_admin(
        &self,
        nic: &str,
        birth_date: &str,
    ) -> Result<Option<AdminRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ADMINS)?;

        match table.get(nic)? {
            Some(data) => {
                let admin: AdminRecord = rmp_serde::from_slice(data.value())?;
                if admin.birth_date == birth_date {
                    Ok(Some(admin))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Reference lists
    // ========================================================================

    /// Distinct school names, in key order. Distinctness is guaranteed by
    /// the table key.
    pub fn school_names(&self) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SCHOOLS)?;

        let mut names = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let school: SchoolRecord = rmp_serde::from_slice(value.value())?;
            names.push(school.name);
        }

        Ok(names)
    }

    /// All (section, subject) pairs, optionally filtered to a section list.
    pub fn subjects(&self, sections: Option<&[String]>) -> Result<Vec<SubjectRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBJECTS)?;

        let mut subjects = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let subject: SubjectRecord = rmp_serde::from_slice(value.value())?;
            if let Some(wanted) = sections {
                if !wanted.contains(&subject.section) {
                    continue;
                }
            }
            subjects.push(subject);
        }

        Ok(subjects)
    }

    /// Full vacancy table, optionally filtered by the eligibility flag.
    pub fn vacancies(&self, eligible: Option<bool>) -> Result<Vec<VacancyRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(VACANCIES)?;

        let mut vacancies = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let vacancy: VacancyRecord = rmp_serde::from_slice(value.value())?;
            if let Some(flag) = eligible {
                if vacancy.eligible != flag {
                    continue;
                }
            }
            vacancies.push(vacancy);
        }

        Ok(vacancies)
    }

    /// Full reciprocal-match table. Per-teacher and per-eligibility
    /// filtering happens at display time; every view re-queries.
    pub fn reciprocal_matches(&self) -> Result<Vec<ReciprocalMatchRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(RECIPROCAL_MATCHES)?;

        let mut matches = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            matches.push(rmp_serde::from_slice(value.value())?);
        }

        Ok(matches)
    }

    /// Full top-N-match table, in (teacher, rank) key order.
    pub fn top_matches(&self) -> Result<Vec<TopMatchRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(TOP_MATCHES)?;

        let mut matches = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            matches.push(rmp_serde::from_slice(value.value())?);
        }

        Ok(matches)
    }

    // ========================================================================
    // Dashboard aggregates
    // ========================================================================

    /// Eligible count, non-eligible count, and per-division counts over the
    /// vacancy table. Three independent aggregates against static reference
    /// data; no cross-query transaction needed.
    pub fn eligibility_kpis(&self) -> Result<EligibilityKpis, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(VACANCIES)?;

        let mut eligible = 0u64;
        let mut not_eligible = 0u64;
        let mut by_division: BTreeMap<String, u64> = BTreeMap::new();

        for result in table.iter()? {
            let (_, value) = result?;
            let vacancy: VacancyRecord = rmp_serde::from_slice(value.value())?;
            if vacancy.eligible {
                eligible += 1;
            } else {
                not_eligible += 1;
            }
            *by_division.entry(vacancy.division).or_insert(0) += 1;
        }

        let divisions = by_division
            .into_iter()
            .map(|(division, teachers)| DivisionCount { division, teachers })
            .collect();

        Ok(EligibilityKpis {
            eligible,
            not_eligible,
            divisions,
        })
    }

    // ========================================================================
    // Out-of-band population
    // ========================================================================

    /// Replace every reference table with the given seed in one write
    /// transaction. Used by the startup seed file and the test-mode import
    /// route; the serving paths never write reference data.
    pub fn replace_reference(&self, seed: &ReferenceSeed) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;

        clear_table(&write_txn, TEACHERS)?;
        clear_table(&write_txn, ADMINS)?;
        clear_table(&write_txn, SCHOOLS)?;
        clear_table(&write_txn, SUBJECTS)?;
        clear_table(&write_txn, VACANCIES)?;
        clear_table(&write_txn, RECIPROCAL_MATCHES)?;
        clear_table(&write_txn, TOP_MATCHES)?;

        {
            let mut table = write_txn.open_table(TEACHERS)?;
            for teacher in &seed.teachers {
                let data = rmp_serde::to_vec_named(teacher)?;
                table.insert(teacher.nic.as_str(), data.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(ADMINS)?;
            for admin in &seed.admins {
                let data = rmp_serde::to_vec_named(admin)?;
                table.insert(admin.nic.as_str(), data.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(SCHOOLS)?;
            for school in &seed.schools {
                let data = rmp_serde::to_vec_named(school)?;
                table.insert(school.name.as_str(), data.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(SUBJECTS)?;
            for subject in &seed.subjects {
                let key = format!("{}/{}", subject.section, subject.subject);
                let data = rmp_serde::to_vec_named(subject)?;
                table.insert(key.as_str(), data.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(VACANCIES)?;
            for vacancy in &seed.vacancies {
                let data = rmp_serde::to_vec_named(vacancy)?;
                table.insert(vacancy.nic.as_str(), data.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(RECIPROCAL_MATCHES)?;
            for pair in &seed.reciprocal_matches {
                let key = format!("{}:{}", pair.teacher_a_nic, pair.teacher_b_nic);
                let data = rmp_serde::to_vec_named(pair)?;
                table.insert(key.as_str(), data.as_slice())?;
            }
        }
        {
            let mut table = write_txn.open_table(TOP_MATCHES)?;
            for candidate in &seed.top_matches {
                let key = format!(
                    "{}:{:04}:{}",
                    candidate.teacher_nic, candidate.rank, candidate.candidate_nic
                );
                let data = rmp_serde::to_vec_named(candidate)?;
                table.insert(key.as_str(), data.as_slice())?;
            }
        }

        write_txn.commit()?;
        Ok(())
    }

    /// Parse a JSON [`ReferenceSeed`] file and apply it.
    pub fn load_seed_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DatabaseError> {
        let data = std::fs::read(path.as_ref())?;
        let seed: ReferenceSeed = serde_json::from_slice(&data)?;
        self.replace_reference(&seed)
    }
}

fn clear_table(
    write_txn: &WriteTransaction,
    def: TableDefinition<&str, &[u8]>,
) -> Result<(), DatabaseError> {
    let table = write_txn.open_table(def)?;
    let keys: Vec<String> = table
        .iter()?
        .map(|r| r.map(|(k, _)| k.value().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    drop(table);

    let mut table = write_txn.open_table(def)?;
    for key in keys {
        table.remove(key.as_str())?;
    }
    Ok(())
}
