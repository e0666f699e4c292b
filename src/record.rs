use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const IDENTITY_FIELDS: [&str; 4] = ["student_id", "first_name", "last_name", "section"];

/// One student row.
///
/// `scores` distinguishes a field that is absent from the record (no key) from
/// a field that is present but has no value (`None`). Only the former is an
/// error for grade calculation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub section: String,
    #[serde(default)]
    pub scores: BTreeMap<String, Option<f64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quizzes_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_grade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curved_grade: Option<f64>,
}

impl StudentRecord {
    pub fn new(student_id: &str, first_name: &str, last_name: &str, section: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            section: section.to_string(),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, field: &str, value: Option<f64>) -> Self {
        self.scores.insert(field.to_string(), value);
        self
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Strict lookup: fails when the key is missing entirely.
    pub fn score(&self, field: &str) -> EngineResult<Option<f64>> {
        self.scores
            .get(field)
            .copied()
            .ok_or_else(|| EngineError::missing_field(&self.student_id, field))
    }

    /// Strict lookup with null mapped to 0.0.
    pub fn score_or_zero(&self, field: &str) -> EngineResult<f64> {
        Ok(self.score(field)?.unwrap_or(0.0))
    }

    /// Lenient lookup: absent and null both yield `None`. Covers derived
    /// fields too, so callers can sort or filter on any numeric column.
    pub fn value(&self, field: &str) -> Option<f64> {
        match field {
            "weighted_grade" => self.weighted_grade,
            "curved_grade" => self.curved_grade,
            "quizzes_average" => self.quizzes_average,
            _ => self.scores.get(field).copied().flatten(),
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match field {
            "student_id" => Some(self.student_id.as_str()),
            "first_name" => Some(self.first_name.as_str()),
            "last_name" => Some(self.last_name.as_str()),
            "section" => Some(self.section.as_str()),
            _ => self.extra.get(field).map(|s| s.as_str()),
        }
    }

    /// Grade used by ranking and averaging; ungraded counts as 0.
    pub fn grade(&self) -> f64 {
        self.weighted_grade.unwrap_or(0.0)
    }
}

fn default_quiz_fields() -> Vec<String> {
    (1..=5).map(|i| format!("quiz{}", i)).collect()
}

fn default_midterm() -> String {
    "midterm".to_string()
}

fn default_final() -> String {
    "final".to_string()
}

fn default_attendance() -> String {
    "attendance_percent".to_string()
}

/// Ordered list of score columns the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSchema {
    #[serde(default = "default_quiz_fields")]
    pub quizzes: Vec<String>,
    #[serde(default = "default_midterm")]
    pub midterm: String,
    #[serde(default = "default_final", rename = "final")]
    pub final_exam: String,
    #[serde(default = "default_attendance")]
    pub attendance: String,
}

impl Default for ScoreSchema {
    fn default() -> Self {
        Self {
            quizzes: default_quiz_fields(),
            midterm: default_midterm(),
            final_exam: default_final(),
            attendance: default_attendance(),
        }
    }
}

impl ScoreSchema {
    pub fn with_quizzes(quizzes: &[&str]) -> Self {
        Self {
            quizzes: quizzes.iter().map(|q| q.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Quiz columns first, then midterm, final, attendance.
    pub fn columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.quizzes.iter().map(|q| q.as_str()).collect();
        cols.push(self.midterm.as_str());
        cols.push(self.final_exam.as_str());
        cols.push(self.attendance.as_str());
        cols
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns().contains(&field)
    }
}
