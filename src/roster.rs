use crate::error::{EngineError, EngineResult};
use crate::record::StudentRecord;
use std::collections::{BTreeMap, HashMap};

/// The flat record list together with its section index.
///
/// The section index and the id lookup are derived data: they only change
/// through the methods on this type, which update all three structures in the
/// same call. Records keep their insertion order in the flat list and inside
/// each section. Both indexes store positions into `records`.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: Vec<StudentRecord>,
    positions: HashMap<String, usize>,
    sections: BTreeMap<String, Vec<usize>>,
}

fn check_identity(r: &StudentRecord) -> EngineResult<()> {
    if r.student_id.trim().is_empty() {
        return Err(EngineError::missing_field("", "student_id"));
    }
    if r.section.trim().is_empty() {
        return Err(EngineError::missing_field(&r.student_id, "section"));
    }
    Ok(())
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<StudentRecord>) -> EngineResult<Self> {
        let mut roster = Roster::new();
        for r in records {
            roster.insert(r)?;
        }
        Ok(roster)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.positions.contains_key(student_id)
    }

    pub fn get(&self, student_id: &str) -> Option<&StudentRecord> {
        self.positions.get(student_id).map(|&i| &self.records[i])
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(|s| s.as_str()).collect()
    }

    /// Records of one section in insertion order; empty for an unknown section.
    pub fn section(&self, name: &str) -> Vec<&StudentRecord> {
        let Some(members) = self.sections.get(name) else {
            return Vec::new();
        };
        members.iter().map(|&i| &self.records[i]).collect()
    }

    /// Owned copies of one section's records, for engine calls.
    pub fn section_records(&self, name: &str) -> Vec<StudentRecord> {
        self.section(name).into_iter().cloned().collect()
    }

    /// All groups keyed by section name.
    pub fn sections(&self) -> BTreeMap<&str, Vec<&StudentRecord>> {
        self.sections
            .iter()
            .map(|(name, members)| {
                let group = members.iter().map(|&i| &self.records[i]).collect();
                (name.as_str(), group)
            })
            .collect()
    }

    pub fn insert(&mut self, record: StudentRecord) -> EngineResult<()> {
        check_identity(&record)?;
        if self.contains(&record.student_id) {
            return Err(EngineError::DuplicateStudent(record.student_id));
        }
        let idx = self.records.len();
        self.sections
            .entry(record.section.clone())
            .or_default()
            .push(idx);
        self.positions.insert(record.student_id.clone(), idx);
        self.records.push(record);
        Ok(())
    }

    /// Replaces the record with the same id. A section change moves the record
    /// to the end of the new section's group.
    pub fn update(&mut self, record: StudentRecord) -> EngineResult<()> {
        check_identity(&record)?;
        let Some(&idx) = self.positions.get(&record.student_id) else {
            return Err(EngineError::UnknownStudent(record.student_id));
        };
        let old_section = self.records[idx].section.clone();
        if old_section != record.section {
            self.unindex(&old_section, idx);
            self.sections
                .entry(record.section.clone())
                .or_default()
                .push(idx);
        }
        self.records[idx] = record;
        Ok(())
    }

    pub fn delete(&mut self, student_id: &str) -> EngineResult<StudentRecord> {
        let Some(idx) = self.positions.remove(student_id) else {
            return Err(EngineError::UnknownStudent(student_id.to_string()));
        };
        let removed = self.records.remove(idx);
        self.unindex(&removed.section, idx);

        // Everything after the removed slot moved down by one.
        for r in &self.records[idx..] {
            if let Some(pos) = self.positions.get_mut(&r.student_id) {
                *pos -= 1;
            }
        }
        for members in self.sections.values_mut() {
            for i in members.iter_mut().filter(|i| **i > idx) {
                *i -= 1;
            }
        }
        Ok(removed)
    }

    /// Swaps in a recomputed record set. Ids and sections must line up with the
    /// current records one-to-one (the output of a grade pass over
    /// `records()`); otherwise the roster is rebuilt from scratch.
    pub fn replace_all(&mut self, records: Vec<StudentRecord>) -> EngineResult<()> {
        let aligned = records.len() == self.records.len()
            && records
                .iter()
                .zip(&self.records)
                .all(|(a, b)| a.student_id == b.student_id && a.section == b.section);
        if aligned {
            self.records = records;
            return Ok(());
        }
        *self = Roster::from_records(records)?;
        Ok(())
    }

    fn unindex(&mut self, section: &str, idx: usize) {
        if let Some(members) = self.sections.get_mut(section) {
            members.retain(|&i| i != idx);
            if members.is_empty() {
                self.sections.remove(section);
            }
        }
    }
}
