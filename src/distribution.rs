use crate::config::Thresholds;
use crate::record::StudentRecord;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeBand {
    A,
    B,
    C,
    D,
    #[serde(rename = "-D")]
    BelowD,
}

impl GradeBand {
    pub fn as_str(self) -> &'static str {
        match self {
            GradeBand::A => "A",
            GradeBand::B => "B",
            GradeBand::C => "C",
            GradeBand::D => "D",
            GradeBand::BelowD => "-D",
        }
    }
}

/// Bands are tested from A down; the grade is rounded to a whole point first.
pub fn letter_for(grade: f64, thresholds: &Thresholds) -> GradeBand {
    let g = grade.round();
    let t = &thresholds.grade_letters;
    if t.a <= g {
        GradeBand::A
    } else if t.b <= g {
        GradeBand::B
    } else if t.c <= g {
        GradeBand::C
    } else if t.d <= g {
        GradeBand::D
    } else {
        GradeBand::BelowD
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "-D")]
    pub below_d: usize,
}

impl GradeDistribution {
    pub fn total(&self) -> usize {
        self.a + self.b + self.c + self.d + self.below_d
    }

    pub fn count(&self, band: GradeBand) -> usize {
        match band {
            GradeBand::A => self.a,
            GradeBand::B => self.b,
            GradeBand::C => self.c,
            GradeBand::D => self.d,
            GradeBand::BelowD => self.below_d,
        }
    }
}

/// Callers are expected to grade records first; an ungraded record lands in
/// whatever band 0 falls into.
pub fn calculate_distribution(
    records: &[StudentRecord],
    thresholds: &Thresholds,
) -> GradeDistribution {
    let mut dist = GradeDistribution::default();
    for r in records {
        match letter_for(r.grade(), thresholds) {
            GradeBand::A => dist.a += 1,
            GradeBand::B => dist.b += 1,
            GradeBand::C => dist.c += 1,
            GradeBand::D => dist.d += 1,
            GradeBand::BelowD => dist.below_d += 1,
        }
    }
    dist
}

fn by_grade(a: &StudentRecord, b: &StudentRecord) -> Ordering {
    a.grade().partial_cmp(&b.grade()).unwrap_or(Ordering::Equal)
}

pub fn get_top_n_students(records: &[StudentRecord], n: usize) -> Vec<StudentRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| by_grade(b, a));
    sorted.truncate(n);
    sorted
}

pub fn get_bottom_n_students(records: &[StudentRecord], n: usize) -> Vec<StudentRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(by_grade);
    sorted.truncate(n);
    sorted
}

pub fn get_average_grade(records: &[StudentRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.grade()).sum::<f64>() / (records.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Text(String),
    Numeric(String),
}

impl SortKey {
    pub fn parse(field: &str) -> Self {
        match field {
            "student_id" | "first_name" | "last_name" | "section" => {
                SortKey::Text(field.to_string())
            }
            _ => SortKey::Numeric(field.to_string()),
        }
    }

    fn compare(&self, a: &StudentRecord, b: &StudentRecord) -> Ordering {
        match self {
            SortKey::Text(f) => a.text(f).unwrap_or("").cmp(b.text(f).unwrap_or("")),
            SortKey::Numeric(f) => {
                let av = a.value(f).unwrap_or(0.0);
                let bv = b.value(f).unwrap_or(0.0);
                av.partial_cmp(&bv).unwrap_or(Ordering::Equal)
            }
        }
    }
}

/// Stable sort on one field. `reverse` flips the comparison, so ties keep
/// their input order either way.
pub fn sort_students(records: &[StudentRecord], field: &str, reverse: bool) -> Vec<StudentRecord> {
    let key = SortKey::parse(field);
    let mut sorted = records.to_vec();
    if reverse {
        sorted.sort_by(|a, b| key.compare(b, a));
    } else {
        sorted.sort_by(|a, b| key.compare(a, b));
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded(id: &str, last: &str, grade: Option<f64>) -> StudentRecord {
        let mut r = StudentRecord::new(id, "F", last, "S");
        r.weighted_grade = grade;
        r
    }

    fn ids(list: &[StudentRecord]) -> Vec<&str> {
        list.iter().map(|r| r.student_id.as_str()).collect()
    }

    #[test]
    fn bands_use_rounded_grade_and_inclusive_bounds() {
        let t = Thresholds::default();
        assert_eq!(letter_for(90.0, &t), GradeBand::A);
        assert_eq!(letter_for(89.5, &t), GradeBand::A);
        assert_eq!(letter_for(89.49, &t), GradeBand::B);
        assert_eq!(letter_for(80.0, &t), GradeBand::B);
        assert_eq!(letter_for(70.0, &t), GradeBand::C);
        assert_eq!(letter_for(60.0, &t), GradeBand::D);
        assert_eq!(letter_for(59.4, &t), GradeBand::BelowD);
    }

    #[test]
    fn distribution_counts_every_record() {
        let recs = vec![
            graded("1", "a", Some(95.0)),
            graded("2", "b", Some(85.0)),
            graded("3", "c", Some(85.2)),
            graded("4", "d", Some(72.0)),
            graded("5", "e", Some(61.0)),
            graded("6", "f", Some(12.0)),
        ];
        let dist = calculate_distribution(&recs, &Thresholds::default());
        assert_eq!(
            dist,
            GradeDistribution {
                a: 1,
                b: 2,
                c: 1,
                d: 1,
                below_d: 1
            }
        );
        assert_eq!(dist.total(), recs.len());
        let json = serde_json::to_value(dist).expect("json");
        assert_eq!(json["-D"], 1);
    }

    #[test]
    fn top_and_bottom_are_stable() {
        let recs = vec![
            graded("1", "a", Some(80.0)),
            graded("2", "b", Some(90.0)),
            graded("3", "c", Some(80.0)),
            graded("4", "d", None),
        ];
        assert_eq!(ids(&get_top_n_students(&recs, 3)), vec!["2", "1", "3"]);
        assert_eq!(ids(&get_bottom_n_students(&recs, 3)), vec!["4", "1", "3"]);
        assert_eq!(get_top_n_students(&recs, 10).len(), 4);
        assert!(get_top_n_students(&recs, 0).is_empty());
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(get_average_grade(&[]), 0.0);
        let recs = vec![graded("1", "a", Some(80.0)), graded("2", "b", None)];
        assert_eq!(get_average_grade(&recs), 40.0);
    }

    #[test]
    fn sort_by_text_and_number() {
        let mut recs = vec![
            graded("1", "Smith", Some(70.0)),
            graded("2", "Doe", Some(95.0)),
            graded("3", "Lee", Some(70.0)),
        ];
        recs[1].scores.insert("midterm".into(), Some(60.0));
        assert_eq!(ids(&sort_students(&recs, "last_name", false)), vec!["2", "3", "1"]);
        assert_eq!(ids(&sort_students(&recs, "weighted_grade", true)), vec!["2", "1", "3"]);
        // Missing midterm sorts as 0.
        assert_eq!(ids(&sort_students(&recs, "midterm", true)), vec!["2", "1", "3"]);
        assert_eq!(SortKey::parse("section"), SortKey::Text("section".into()));
    }
}
