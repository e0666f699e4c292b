//! Narrative analytics over a graded record set: midterm-to-final movement,
//! attendance versus grade, the hardest quiz, and per-section quiz leaders.

use crate::record::{ScoreSchema, StudentRecord};
use crate::roster::Roster;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ATTENDANCE_THRESHOLD: f64 = 80.0;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / (values.len() as f64)
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64) / (total as f64) * 100.0
    }
}

/// `quiz_3` -> `Quiz 3`, `quiz1` -> `Quiz1`.
fn pretty_field(field: &str) -> String {
    field
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementCounts {
    pub improved: usize,
    pub same: usize,
    pub declined: usize,
    pub declined_or_same: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementPercentages {
    pub improved: f64,
    pub same: f64,
    pub declined: f64,
    pub declined_or_same: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementReport {
    pub total_students: usize,
    pub counts: ImprovementCounts,
    pub percentages: ImprovementPercentages,
    pub avg_improvement: f64,
    pub avg_decline: f64,
    pub suggestions: Vec<String>,
}

/// Only students with both a midterm and a final score take part.
pub fn track_midterm_to_final_improvement(
    records: &[StudentRecord],
    schema: &ScoreSchema,
) -> ImprovementReport {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.value(&schema.midterm)?, r.value(&schema.final_exam)?)))
        .collect();
    if pairs.is_empty() {
        return ImprovementReport::default();
    }

    let gains: Vec<f64> = pairs
        .iter()
        .filter(|(m, f)| f > m)
        .map(|(m, f)| f - m)
        .collect();
    let drops: Vec<f64> = pairs
        .iter()
        .filter(|(m, f)| f < m)
        .map(|(m, f)| m - f)
        .collect();
    let same = pairs.iter().filter(|(m, f)| f == m).count();

    let total = pairs.len();
    let counts = ImprovementCounts {
        improved: gains.len(),
        same,
        declined: drops.len(),
        declined_or_same: total - gains.len(),
    };
    let percentages = ImprovementPercentages {
        improved: pct(counts.improved, total),
        same: pct(counts.same, total),
        declined: pct(counts.declined, total),
        declined_or_same: pct(counts.declined_or_same, total),
    };

    let mut suggestions = Vec::new();
    if percentages.declined_or_same >= 30.0 {
        suggestions.push(format!(
            "The {:.0}% who didn't improve may need different strategies for cumulative exams.",
            percentages.declined_or_same
        ));
    }
    if counts.declined > 0 {
        suggestions.push(format!(
            "Provide additional resources or remediation for {} students who declined.",
            counts.declined
        ));
    }
    if percentages.improved < 50.0 {
        suggestions.push(
            "Less than half improved; review final exam prep and study sessions.".to_string(),
        );
    } else if percentages.improved >= 70.0 {
        suggestions.push(
            "Excellent improvement rate; continue current teaching and review strategies."
                .to_string(),
        );
    }

    ImprovementReport {
        total_students: total,
        counts,
        percentages,
        avg_improvement: mean(&gains),
        avg_decline: mean(&drops),
        suggestions,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    /// Classifies the grade gap between high- and low-attendance groups.
    pub fn from_gap(gap: f64) -> Self {
        if gap > 10.0 {
            CorrelationStrength::Strong
        } else if gap > 5.0 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCorrelation {
    pub threshold: f64,
    pub low_count: usize,
    pub high_count: usize,
    pub low_avg_grade: f64,
    pub high_avg_grade: f64,
    pub grade_difference: f64,
    pub strength: Option<CorrelationStrength>,
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Splits at `threshold` (low is `<`, high is `>=`); students without an
/// attendance value are left out, and group means only count graded members.
pub fn correlate_attendance_and_grades(
    records: &[StudentRecord],
    schema: &ScoreSchema,
    threshold: f64,
) -> AttendanceCorrelation {
    let mut low: Vec<&StudentRecord> = Vec::new();
    let mut high: Vec<&StudentRecord> = Vec::new();
    for r in records {
        match r.value(&schema.attendance) {
            Some(a) if a < threshold => low.push(r),
            Some(_) => high.push(r),
            None => {}
        }
    }

    fn group_avg(group: &[&StudentRecord]) -> f64 {
        let grades: Vec<f64> = group.iter().filter_map(|r| r.weighted_grade).collect();
        mean(&grades)
    }
    let low_avg_grade = group_avg(&low);
    let high_avg_grade = group_avg(&high);
    let grade_difference = high_avg_grade - low_avg_grade;

    let mut insights = Vec::new();
    let mut suggestions = Vec::new();
    let mut strength = None;

    match (low.is_empty(), high.is_empty()) {
        (true, true) => {}
        (false, false) => {
            let qualifier = if low_avg_grade < high_avg_grade {
                "significantly worse"
            } else {
                "similarly"
            };
            insights.push(format!(
                "Low-attendance students (avg {:.1}%) performed {} \
                 vs high-attendance students (avg {:.1}%).",
                low_avg_grade, qualifier, high_avg_grade
            ));
            let s = CorrelationStrength::from_gap(grade_difference);
            match s {
                CorrelationStrength::Strong => suggestions.push(
                    "Strong correlation: encourage better attendance (large grade gap)."
                        .to_string(),
                ),
                CorrelationStrength::Moderate => suggestions
                    .push("Moderate correlation between attendance and grades.".to_string()),
                CorrelationStrength::Weak => {
                    insights.push("Correlation appears weak (small grade gap).".to_string())
                }
            }
            strength = Some(s);
        }
        (false, true) => {
            insights.push(format!("Low-attendance group avg grade: {:.1}%.", low_avg_grade));
            suggestions.push(
                "All students have low attendance; focus on improving attendance rates."
                    .to_string(),
            );
        }
        (true, false) => {
            insights.push(format!("High-attendance group avg grade: {:.1}%.", high_avg_grade));
            insights.push(format!(
                "All students meet attendance threshold (>={:.0}%).",
                threshold
            ));
        }
    }

    AttendanceCorrelation {
        threshold,
        low_count: low.len(),
        high_count: high.len(),
        low_avg_grade,
        high_avg_grade,
        grade_difference,
        strength,
        insights,
        suggestions,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAverage {
    pub quiz: String,
    pub average: f64,
    pub count: usize,
}

/// Class average per schema quiz over the scores that are present.
pub fn quiz_averages(records: &[StudentRecord], schema: &ScoreSchema) -> Vec<QuizAverage> {
    schema
        .quizzes
        .iter()
        .map(|quiz| {
            let scores: Vec<f64> = records.iter().filter_map(|r| r.value(quiz)).collect();
            QuizAverage {
                quiz: quiz.clone(),
                average: mean(&scores),
                count: scores.len(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardestTopicReport {
    pub quiz_averages: Vec<QuizAverage>,
    pub hardest_quiz: Option<String>,
    pub lowest_avg: f64,
    pub insight: String,
    pub suggestion: String,
}

/// Quizzes nobody has a score for are listed but never picked as hardest.
pub fn find_hardest_topic(records: &[StudentRecord], schema: &ScoreSchema) -> HardestTopicReport {
    let averages = quiz_averages(records, schema);
    let mut hardest: Option<&QuizAverage> = None;
    for qa in averages.iter().filter(|qa| qa.count > 0) {
        if hardest.map(|h| qa.average < h.average).unwrap_or(true) {
            hardest = Some(qa);
        }
    }

    let Some(h) = hardest else {
        return HardestTopicReport {
            quiz_averages: averages,
            ..HardestTopicReport::default()
        };
    };
    let pretty = pretty_field(&h.quiz);
    let insight = format!("The lowest-scoring activity was {} ({:.1}%).", pretty, h.average);
    let suggestion = format!(
        "The topic for {} appears to be a class-wide weakness; review recommended.",
        pretty
    );
    let hardest_quiz = Some(h.quiz.clone());
    let lowest_avg = h.average;
    HardestTopicReport {
        quiz_averages: averages,
        hardest_quiz,
        lowest_avg,
        insight,
        suggestion,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLow {
    pub section: String,
    pub avg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionComparison {
    pub quiz_keys: Vec<String>,
    /// section -> quiz -> average
    pub average_scores: BTreeMap<String, BTreeMap<String, f64>>,
    pub lowest_per_quiz: BTreeMap<String, SectionLow>,
    pub insights: Vec<String>,
}

/// Per-section quiz averages and, for each quiz, the section with the lowest
/// average (first section name wins ties). Leaderboard lines are only
/// produced when there is more than one section to compare.
pub fn compare_sections(roster: &Roster, schema: &ScoreSchema) -> SectionComparison {
    let mut average_scores: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for (section, members) in roster.sections() {
        let per_quiz = schema
            .quizzes
            .iter()
            .map(|quiz| {
                let scores: Vec<f64> = members.iter().filter_map(|r| r.value(quiz)).collect();
                (quiz.clone(), mean(&scores))
            })
            .collect();
        average_scores.insert(section.to_string(), per_quiz);
    }

    let mut lowest_per_quiz = BTreeMap::new();
    let mut insights = Vec::new();
    for quiz in &schema.quizzes {
        let mut low: Option<(&str, f64)> = None;
        for (section, per_quiz) in &average_scores {
            let avg = per_quiz.get(quiz).copied().unwrap_or(0.0);
            if low.map(|(_, l)| avg < l).unwrap_or(true) {
                low = Some((section.as_str(), avg));
            }
        }
        let Some((section, avg)) = low else {
            continue;
        };
        lowest_per_quiz.insert(
            quiz.clone(),
            SectionLow {
                section: section.to_string(),
                avg,
            },
        );

        if average_scores.len() > 1 {
            let pretty = pretty_field(quiz);
            let parts: Vec<String> = average_scores
                .iter()
                .map(|(s, per_quiz)| {
                    format!("{}: {:.0}%", s, per_quiz.get(quiz).copied().unwrap_or(0.0))
                })
                .collect();
            insights.push(format!("{}: {}.", pretty, parts.join(", ")));
            insights.push(format!("Lowest average for {}: {} ({:.0}%).", pretty, section, avg));
        }
    }

    SectionComparison {
        quiz_keys: schema.quizzes.clone(),
        average_scores,
        lowest_per_quiz,
        insights,
    }
}

/// Graded students strictly below `cutoff`, in input order.
pub fn get_at_risk_students(records: &[StudentRecord], cutoff: f64) -> Vec<StudentRecord> {
    records
        .iter()
        .filter(|r| r.weighted_grade.map(|g| g < cutoff).unwrap_or(false))
        .cloned()
        .collect()
}
