use crate::record::{ScoreSchema, IDENTITY_FIELDS};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coefficients of the composite grade. They are not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub quizzes_total: f64,
    pub midterm: f64,
    #[serde(rename = "final")]
    pub final_exam: f64,
    pub attendance: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            quizzes_total: 0.2,
            midterm: 0.3,
            final_exam: 0.4,
            attendance: 0.1,
        }
    }
}

/// Lower bounds of the letter bands, compared as `bound <= grade`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeLetters {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "D")]
    pub d: f64,
}

impl Default for GradeLetters {
    fn default() -> Self {
        Self {
            a: 90.0,
            b: 80.0,
            c: 70.0,
            d: 60.0,
        }
    }
}

fn default_at_risk() -> f64 {
    65.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub grade_letters: GradeLetters,
    #[serde(default = "default_at_risk")]
    pub at_risk: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            grade_letters: GradeLetters::default(),
            at_risk: default_at_risk(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePaths {
    #[serde(default)]
    pub input_csv: Option<String>,
    #[serde(default)]
    pub output_csv: Option<String>,
}

fn default_required_columns() -> Vec<String> {
    IDENTITY_FIELDS.iter().map(|f| f.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRules {
    #[serde(default = "default_required_columns")]
    pub required: Vec<String>,
    /// Extra numeric columns on top of the score schema.
    #[serde(default)]
    pub numeric: Vec<String>,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            required: default_required_columns(),
            numeric: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub file_paths: FilePaths,
    #[serde(default)]
    pub columns: ColumnRules,
    #[serde(default)]
    pub grade_weights: WeightConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub score_fields: ScoreSchema,
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(text)?;
        if cfg.score_fields.quizzes.is_empty() {
            anyhow::bail!("score_fields.quizzes must name at least one quiz column");
        }
        Ok(cfg)
    }

    /// Schema score fields plus any extra configured numeric columns, in order,
    /// without duplicates.
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .score_fields
            .columns()
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        for c in &self.columns.numeric {
            if !out.contains(c) {
                out.push(c.clone());
            }
        }
        out
    }
}
