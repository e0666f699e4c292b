use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{optional_f64, required_f64, required_str, scoped_records};
use crate::ipc::types::{AppState, Request};
use gradebookd::curve::{apply_grade_curve, CurveMethod};
use gradebookd::distribution::{
    calculate_distribution, get_average_grade, get_bottom_n_students, get_top_n_students,
};
use gradebookd::percentile::{calculate_percentile, find_outliers, quartiles};
use serde_json::json;

const DEFAULT_RANK_COUNT: usize = 5;

fn handle_distribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let thresholds = &state.config.thresholds;
    let dist = calculate_distribution(&records, thresholds);
    let ungraded = records.iter().filter(|r| r.weighted_grade.is_none()).count();
    ok(
        &req.id,
        json!({
            "thresholds": thresholds.grade_letters,
            "counts": dist,
            "total": dist.total(),
            "ungradedCount": ungraded,
        }),
    )
}

fn handle_rankings(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let n = match optional_f64(req, "n") {
        Ok(Some(v)) if v >= 0.0 && v.fract() == 0.0 => v as usize,
        Ok(Some(_)) => return err(&req.id, "bad_params", "n must be a non-negative integer", None),
        Ok(None) => DEFAULT_RANK_COUNT,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "n": n,
            "average": get_average_grade(&records),
            "studentCount": records.len(),
            "top": get_top_n_students(&records, n),
            "bottom": get_bottom_n_students(&records, n),
        }),
    )
}

fn handle_percentile(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let p = match required_f64(req, "p") {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "p": p,
            "method": "linear",
            "value": calculate_percentile(&records, p),
        }),
    )
}

fn handle_outliers(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "quartiles": quartiles(&records),
            "outliers": find_outliers(&records),
        }),
    )
}

/// Returns curved copies; the roster keeps its uncurved grades.
fn handle_curve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let method = match required_str(req, "method") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(method) = CurveMethod::parse(&method) else {
        return err(
            &req.id,
            "bad_params",
            format!("method must be 'flat' or 'normalize', got '{}'", method),
            None,
        );
    };
    let value = match required_f64(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match apply_grade_curve(&records, method, value) {
        Ok(curved) => ok(
            &req.id,
            json!({
                "method": method.as_str(),
                "value": value,
                "students": curved,
            }),
        ),
        Err(e) => engine_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.distribution" => Some(handle_distribution(state, req)),
        "analytics.rankings" => Some(handle_rankings(state, req)),
        "analytics.percentile" => Some(handle_percentile(state, req)),
        "analytics.outliers" => Some(handle_outliers(state, req)),
        "analytics.curve" => Some(handle_curve(state, req)),
        _ => None,
    }
}
