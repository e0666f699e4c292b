//! CSV ingestion: turns a student sheet into validated records.
//!
//! Rows missing a required column are skipped, and so are rows repeating a
//! `student_id` seen earlier in the sheet. Numeric columns outside
//! `[0, 100]` or that fail to parse are kept as null. Both cases are logged
//! and reported back with the 1-based line number (the header is line 1).

use crate::config::EngineConfig;
use crate::record::{StudentRecord, IDENTITY_FIELDS};
use anyhow::Context;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestWarning {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub records: Vec<StudentRecord>,
    pub skipped_rows: usize,
    pub warnings: Vec<IngestWarning>,
}

pub fn read_csv_records(path: &Path, cfg: &EngineConfig) -> anyhow::Result<IngestReport> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let report = read_csv_from(file, cfg).with_context(|| format!("read {}", path.display()))?;
    info!(
        path = %path.display(),
        records = report.records.len(),
        skipped = report.skipped_rows,
        warnings = report.warnings.len(),
        "csv ingested"
    );
    Ok(report)
}

pub fn read_csv_from<R: Read>(reader: R, cfg: &EngineConfig) -> anyhow::Result<IngestReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let numeric = cfg.numeric_columns();

    let mut report = IngestReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    for (i, row) in rdr.records().enumerate() {
        let line = i + 2;
        let row = row?;
        let cells: HashMap<&str, &str> = headers
            .iter()
            .map(|h| h.as_str())
            .zip(row.iter())
            .collect();

        let missing: Vec<&str> = cfg
            .columns
            .required
            .iter()
            .map(|c| c.as_str())
            .filter(|c| cells.get(c).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            warn!(line, missing = ?missing, "skipping row with missing required fields");
            report.warnings.push(IngestWarning {
                line,
                column: None,
                message: format!("missing required field(s): {}", missing.join(", ")),
            });
            report.skipped_rows += 1;
            continue;
        }

        let text = |field: &str| cells.get(field).copied().unwrap_or("").to_string();
        let student_id = text("student_id");
        if !seen.insert(student_id.clone()) {
            warn!(line, student_id = %student_id, "skipping row with duplicate student_id");
            report.warnings.push(IngestWarning {
                line,
                column: Some("student_id".to_string()),
                message: format!("duplicate student_id '{}', row skipped", student_id),
            });
            report.skipped_rows += 1;
            continue;
        }
        let mut record = StudentRecord::new(
            &student_id,
            &text("first_name"),
            &text("last_name"),
            &text("section"),
        );

        for col in &numeric {
            let raw = cells.get(col.as_str()).copied().unwrap_or("");
            let value = if raw.is_empty() {
                None
            } else {
                match raw.parse::<f64>() {
                    Ok(v) if (0.0..=100.0).contains(&v) => Some(v),
                    Ok(_) => {
                        warn!(line, column = %col, value = raw, "score out of range, set to null");
                        report.warnings.push(IngestWarning {
                            line,
                            column: Some(col.clone()),
                            message: format!("invalid value '{}', set to null", raw),
                        });
                        None
                    }
                    Err(_) => {
                        warn!(line, column = %col, value = raw, "non-numeric score, set to null");
                        report.warnings.push(IngestWarning {
                            line,
                            column: Some(col.clone()),
                            message: format!("non-numeric value '{}', set to null", raw),
                        });
                        None
                    }
                }
            };
            record.scores.insert(col.clone(), value);
        }

        for (h, v) in &cells {
            if IDENTITY_FIELDS.contains(h) || numeric.iter().any(|c| c == h) {
                continue;
            }
            record.extra.insert(h.to_string(), v.to_string());
        }

        report.records.push(record);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
student_id,first_name,middle_name,last_name,section,quiz1,quiz2,quiz3,quiz4,quiz5,midterm,final,attendance_percent
2024-0001, John ,Q,Doe,BSIT-1A,85,90,88,92,89,91,93,95
2024-0002,Jane,,Smith,BSIT-1A,75,,82.5,70,68,73,78,
,Ghost,,Nobody,BSIT-1B,1,2,3,4,5,6,7,8
2024-0003,Chris,,Lee,BSIT-1B,101,abc,,,,,60,80
";

    #[test]
    fn parses_and_validates_rows() {
        let report = read_csv_from(SHEET.as_bytes(), &EngineConfig::default()).expect("read");
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.skipped_rows, 1);

        let john = &report.records[0];
        assert_eq!(john.first_name, "John");
        assert_eq!(john.scores["quiz1"], Some(85.0));
        assert_eq!(john.extra["middle_name"], "Q");

        let jane = &report.records[1];
        assert_eq!(jane.scores["quiz2"], None);
        assert_eq!(jane.scores["quiz3"], Some(82.5));
        assert_eq!(jane.scores["attendance_percent"], None);

        let chris = &report.records[2];
        assert_eq!(chris.scores["quiz1"], None);
        assert_eq!(chris.scores["quiz2"], None);
        assert_eq!(chris.scores["final"], Some(60.0));
        // Every schema field is present even when blank.
        assert_eq!(chris.scores.len(), 8);

        let lines: Vec<usize> = report.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![4, 5, 5]);
        assert_eq!(report.warnings[1].column.as_deref(), Some("quiz1"));
    }

    #[test]
    fn repeated_student_id_is_skipped_with_warning() {
        let sheet = "\
student_id,first_name,last_name,section,quiz1
2024-0001,John,Doe,BSIT-1A,85
2024-0002,Jane,Smith,BSIT-1A,75
2024-0001,Johnny,Doe,BSIT-1B,99
";
        let report = read_csv_from(sheet.as_bytes(), &EngineConfig::default()).expect("read");
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.records[0].first_name, "John");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 4);
        assert_eq!(report.warnings[0].column.as_deref(), Some("student_id"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = Path::new("/definitely/not/here.csv");
        let err = read_csv_records(path, &EngineConfig::default()).unwrap_err();
        assert!(err.to_string().contains("not/here.csv"));
    }
}
