use crate::calc::round_off_2_decimals;
use crate::error::{EngineError, EngineResult};
use crate::record::StudentRecord;
use serde::Serialize;

/// Parsed from request params with [`CurveMethod::parse`], which accepts any
/// case and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveMethod {
    /// Add a fixed number of points.
    Flat,
    /// Scale so the best grade lands on the target value.
    Normalize,
}

impl CurveMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(CurveMethod::Flat),
            "normalize" => Some(CurveMethod::Normalize),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CurveMethod::Flat => "flat",
            CurveMethod::Normalize => "normalize",
        }
    }
}

/// Writes `curved_grade` on copies of the input; `weighted_grade` is kept for
/// comparison. Flat curves are not capped at 100. Ungraded records pass
/// through with no curved grade.
pub fn apply_grade_curve(
    records: &[StudentRecord],
    method: CurveMethod,
    value: f64,
) -> EngineResult<Vec<StudentRecord>> {
    let transform: Box<dyn Fn(f64) -> f64> = match method {
        CurveMethod::Flat => Box::new(move |g| g + value),
        CurveMethod::Normalize => {
            let max = records
                .iter()
                .filter_map(|r| r.weighted_grade)
                .fold(None, |acc: Option<f64>, g| Some(acc.map_or(g, |m| m.max(g))));
            let Some(max) = max else {
                return Err(EngineError::DegenerateInput {
                    operation: "normalize curve",
                    reason: "no graded records".to_string(),
                });
            };
            if max <= 0.0 {
                return Err(EngineError::DegenerateInput {
                    operation: "normalize curve",
                    reason: format!("maximum grade is {}", max),
                });
            }
            let factor = value / max;
            Box::new(move |g| g * factor)
        }
    };

    Ok(records
        .iter()
        .map(|r| {
            let mut out = r.clone();
            out.curved_grade = r.weighted_grade.map(|g| round_off_2_decimals(transform(g)));
            out
        })
        .collect())
}
