//! Array-based grade calculation for large rosters.
//!
//! Records are packed into a dense row-major matrix (quiz columns first, then
//! midterm, final, attendance) and reduced in one pass per row. The arithmetic
//! follows [`crate::calc`] step for step so both paths produce identical
//! rounded grades.

use crate::calc::{combine, quiz_mean};
use crate::config::WeightConfig;
use crate::error::{EngineError, EngineResult};
use crate::record::{ScoreSchema, StudentRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    quiz_cols: usize,
    data: Vec<f64>,
}

impl ScoreMatrix {
    /// Nulls become 0.0; a record without one of the schema keys fails.
    pub fn from_records(records: &[StudentRecord], schema: &ScoreSchema) -> EngineResult<Self> {
        let columns = schema.columns();
        let cols = columns.len();
        let mut data = Vec::with_capacity(records.len() * cols);
        for r in records {
            for field in &columns {
                data.push(r.score_or_zero(field)?);
            }
        }
        Ok(Self {
            rows: records.len(),
            cols,
            quiz_cols: schema.quizzes.len(),
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Per-row `(quizzes_average, weighted_grade)`.
    pub fn weighted_grades(&self, weights: &ColumnWeights) -> EngineResult<Vec<(f64, f64)>> {
        if weights.values.len() != self.cols {
            return Err(EngineError::ShapeMismatch {
                block: "column",
                weights: weights.values.len(),
                columns: self.cols,
            });
        }
        if weights.quiz_cols != self.quiz_cols {
            return Err(EngineError::ShapeMismatch {
                block: "quiz",
                weights: weights.quiz_cols,
                columns: self.quiz_cols,
            });
        }
        let q = self.quiz_cols;
        let named = weights.named_weights();

        let mut out = Vec::with_capacity(self.rows);
        for row in self.data.chunks_exact(self.cols) {
            let quiz_sum = row[..q].iter().fold(0.0_f64, |acc, v| acc + v);
            let qavg = quiz_mean(quiz_sum, q);
            let grade = combine(qavg, row[q], row[q + 1], row[q + 2], &named);
            out.push((qavg, grade));
        }
        Ok(out)
    }
}

/// Midterm, final and attendance follow the quiz block.
const NAMED_COLUMNS: usize = 3;

/// One weight per matrix column.
///
/// Each quiz column carries an equal share of the quiz total; midterm, final
/// and attendance carry their named weight. The quiz block is reduced to its
/// rounded mean before weighting, so the block is scaled by the configured
/// total rather than by the summed shares. Unequal quiz shares cannot be
/// expressed that way and are rejected on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWeights {
    values: Vec<f64>,
    quiz_cols: usize,
    quizzes_total: f64,
}

impl ColumnWeights {
    pub fn for_schema(weights: &WeightConfig, schema: &ScoreSchema) -> Self {
        let quiz_cols = schema.quizzes.len();
        let share = if quiz_cols > 0 {
            weights.quizzes_total / (quiz_cols as f64)
        } else {
            0.0
        };
        let mut values = vec![share; quiz_cols];
        values.push(weights.midterm);
        values.push(weights.final_exam);
        values.push(weights.attendance);
        Self {
            values,
            quiz_cols,
            quizzes_total: weights.quizzes_total,
        }
    }

    /// Raw column weights: `quiz_cols` equal quiz shares followed by midterm,
    /// final and attendance. Both widths are checked against the matrix again
    /// at evaluation time.
    pub fn from_values(values: Vec<f64>, quiz_cols: usize) -> EngineResult<Self> {
        if values.len() != quiz_cols + NAMED_COLUMNS {
            return Err(EngineError::ShapeMismatch {
                block: "quiz",
                weights: values.len().saturating_sub(NAMED_COLUMNS),
                columns: quiz_cols,
            });
        }
        let shares = &values[..quiz_cols];
        if let Some(first) = shares.first() {
            if let Some(odd) = shares.iter().find(|w| w.to_bits() != first.to_bits()) {
                return Err(EngineError::DegenerateInput {
                    operation: "build column weights",
                    reason: format!("quiz shares must be equal, got {} and {}", first, odd),
                });
            }
        }
        let quizzes_total = shares.first().map_or(0.0, |w| w * (quiz_cols as f64));
        Ok(Self {
            values,
            quiz_cols,
            quizzes_total,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn quiz_cols(&self) -> usize {
        self.quiz_cols
    }

    fn named_weights(&self) -> WeightConfig {
        let at = |i: usize| self.values.get(self.quiz_cols + i).copied().unwrap_or(0.0);
        WeightConfig {
            quizzes_total: self.quizzes_total,
            midterm: at(0),
            final_exam: at(1),
            attendance: at(2),
        }
    }
}

/// Matrix counterpart of [`crate::calc::compute_weighted_grades`].
pub fn compute_weighted_grades_vectorized(
    records: &[StudentRecord],
    weights: &WeightConfig,
    schema: &ScoreSchema,
) -> EngineResult<Vec<StudentRecord>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    let matrix = ScoreMatrix::from_records(records, schema)?;
    let grades = matrix.weighted_grades(&ColumnWeights::for_schema(weights, schema))?;
    Ok(records
        .iter()
        .zip(grades)
        .map(|(r, (qavg, grade))| {
            let mut out = r.clone();
            out.quizzes_average = Some(qavg);
            out.weighted_grade = Some(grade);
            out
        })
        .collect())
}
