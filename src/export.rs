use crate::record::{ScoreSchema, StudentRecord, IDENTITY_FIELDS};
use anyhow::Context;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Header order: identity, schema scores, extra text columns (sorted), then
/// derived grades.
pub fn export_header(records: &[StudentRecord], schema: &ScoreSchema) -> Vec<String> {
    let extra: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extra.keys().map(|k| k.as_str()))
        .collect();
    IDENTITY_FIELDS
        .iter()
        .copied()
        .chain(schema.columns())
        .chain(extra)
        .chain(["quizzes_average", "weighted_grade", "curved_grade"])
        .map(|s| s.to_string())
        .collect()
}

pub fn write_csv_to<W: Write>(
    writer: W,
    records: &[StudentRecord],
    schema: &ScoreSchema,
) -> anyhow::Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }
    let header = export_header(records, schema);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)?;
    for r in records {
        let row: Vec<String> = header
            .iter()
            .map(|col| match col.as_str() {
                "quizzes_average" => fmt_opt(r.quizzes_average),
                "weighted_grade" => fmt_opt(r.weighted_grade),
                "curved_grade" => fmt_opt(r.curved_grade),
                c if schema.contains(c) => fmt_opt(r.value(c)),
                c => r.text(c).unwrap_or("").to_string(),
            })
            .collect();
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(records.len())
}

/// Writes nothing (and creates no file) for an empty record set.
pub fn write_csv(
    path: &Path,
    records: &[StudentRecord],
    schema: &ScoreSchema,
) -> anyhow::Result<usize> {
    if records.is_empty() {
        debug!(path = %path.display(), "nothing to export");
        return Ok(0);
    }
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let n = write_csv_to(file, records, schema)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = n, "csv exported");
    Ok(n)
}
