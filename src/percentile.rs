//! Quantiles of the weighted-grade distribution and IQR outlier fencing.
//!
//! Percentiles use linear interpolation between order statistics: for `n`
//! sorted grades the rank is `h = (n - 1) * p / 100` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`. This is
//! the default "linear" method of most statistics packages. Only records
//! with a `weighted_grade` take part.

use crate::record::StudentRecord;
use serde::Serialize;
use std::cmp::Ordering;

fn sorted_grades(records: &[StudentRecord]) -> Vec<f64> {
    let mut grades: Vec<f64> = records.iter().filter_map(|r| r.weighted_grade).collect();
    grades.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    grades
}

/// `p` is clamped to `[0, 100]`. `None` when nothing is graded or `p` is NaN.
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || p.is_nan() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    let h = ((sorted.len() - 1) as f64) * p / 100.0;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = h - (lo as f64);
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

pub fn calculate_percentile(records: &[StudentRecord], p: f64) -> Option<f64> {
    percentile_of_sorted(&sorted_grades(records), p)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quartiles {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
}

impl Quartiles {
    pub fn contains(&self, grade: f64) -> bool {
        grade >= self.lower_fence && grade <= self.upper_fence
    }
}

pub fn quartiles(records: &[StudentRecord]) -> Option<Quartiles> {
    let sorted = sorted_grades(records);
    let q1 = percentile_of_sorted(&sorted, 25.0)?;
    let q3 = percentile_of_sorted(&sorted, 75.0)?;
    let iqr = q3 - q1;
    Some(Quartiles {
        q1,
        q3,
        iqr,
        lower_fence: q1 - 1.5 * iqr,
        upper_fence: q3 + 1.5 * iqr,
    })
}

/// Records strictly outside the fences, in input order.
pub fn find_outliers(records: &[StudentRecord]) -> Vec<StudentRecord> {
    let Some(q) = quartiles(records) else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| r.weighted_grade.map(|g| !q.contains(g)).unwrap_or(false))
        .cloned()
        .collect()
}
