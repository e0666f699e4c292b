use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{optional_str, scoped_records};
use crate::ipc::types::{AppState, Request};
use gradebookd::curve::{apply_grade_curve, CurveMethod};
use gradebookd::export::write_csv;
use serde_json::json;
use std::path::PathBuf;

/// Optional `curve: { method, value }` is applied to the exported copy only.
fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match optional_str(req, "path") {
        Ok(Some(v)) => PathBuf::from(v),
        Ok(None) => match state.config.file_paths.output_csv.as_ref() {
            Some(p) => PathBuf::from(p),
            None => return err(&req.id, "bad_params", "missing path", None),
        },
        Err(e) => return e,
    };
    let mut records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    if let Some(curve) = req.params.get("curve").filter(|v| !v.is_null()) {
        let method = curve
            .get("method")
            .and_then(|v| v.as_str())
            .and_then(CurveMethod::parse);
        let value = curve.get("value").and_then(|v| v.as_f64());
        let (Some(method), Some(value)) = (method, value) else {
            return err(
                &req.id,
                "bad_params",
                "curve must be { method: 'flat' | 'normalize', value: number }",
                None,
            );
        };
        records = match apply_grade_curve(&records, method, value) {
            Ok(v) => v,
            Err(e) => return engine_err(&req.id, e),
        };
    }

    match write_csv(&path, &records, &state.config.score_fields) {
        Ok(rows) => ok(
            &req.id,
            json!({
                "path": path.to_string_lossy(),
                "rowsExported": rows,
                "exportedAt": chrono::Utc::now().to_rfc3339(),
            }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.csv" => Some(handle_export_csv(state, req)),
        _ => None,
    }
}
