use crate::config::WeightConfig;
use crate::error::EngineResult;
use crate::record::{ScoreSchema, StudentRecord};
use serde::Serialize;

/// Round half away from zero to 2 decimals. Both grade paths go through this.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Quiz average with nulls counted as 0.0; the divisor is the number of quiz
/// slots, not the number of present scores.
pub fn quiz_average(record: &StudentRecord, schema: &ScoreSchema) -> EngineResult<f64> {
    let mut sum = 0.0_f64;
    for field in &schema.quizzes {
        sum += record.score_or_zero(field)?;
    }
    Ok(quiz_mean(sum, schema.quizzes.len()))
}

pub(crate) fn quiz_mean(sum: f64, slots: usize) -> f64 {
    if slots == 0 {
        return 0.0;
    }
    round_off_2_decimals(sum / (slots as f64))
}

/// Fixed evaluation order shared by the scalar and the matrix path.
pub(crate) fn combine(
    quiz_avg: f64,
    midterm: f64,
    final_exam: f64,
    attendance: f64,
    weights: &WeightConfig,
) -> f64 {
    let composite = quiz_avg * weights.quizzes_total
        + midterm * weights.midterm
        + final_exam * weights.final_exam
        + attendance * weights.attendance;
    round_off_2_decimals(composite)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBreakdown {
    pub quizzes_average: f64,
    pub midterm: f64,
    pub final_exam: f64,
    pub attendance: f64,
    pub weighted_grade: f64,
}

pub fn compute_weighted_grade(
    record: &StudentRecord,
    weights: &WeightConfig,
    schema: &ScoreSchema,
) -> EngineResult<GradeBreakdown> {
    let quizzes_average = quiz_average(record, schema)?;
    let midterm = record.score_or_zero(&schema.midterm)?;
    let final_exam = record.score_or_zero(&schema.final_exam)?;
    let attendance = record.score_or_zero(&schema.attendance)?;
    Ok(GradeBreakdown {
        quizzes_average,
        midterm,
        final_exam,
        attendance,
        weighted_grade: combine(quizzes_average, midterm, final_exam, attendance, weights),
    })
}

/// Returns new records carrying `quizzes_average` and `weighted_grade`, same
/// length and order as the input. The input is left untouched.
pub fn compute_weighted_grades(
    records: &[StudentRecord],
    weights: &WeightConfig,
    schema: &ScoreSchema,
) -> EngineResult<Vec<StudentRecord>> {
    records
        .iter()
        .map(|r| {
            let b = compute_weighted_grade(r, weights, schema)?;
            let mut out = r.clone();
            out.quizzes_average = Some(b.quizzes_average);
            out.weighted_grade = Some(b.weighted_grade);
            Ok(out)
        })
        .collect()
}
