use crate::ipc::error::ok;
use crate::ipc::helpers::{optional_f64, roster, scoped_records};
use crate::ipc::types::{AppState, Request};
use gradebookd::insights::{
    compare_sections, correlate_attendance_and_grades, find_hardest_topic, get_at_risk_students,
    track_midterm_to_final_improvement, DEFAULT_ATTENDANCE_THRESHOLD,
};
use serde_json::json;

fn handle_improvement(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report = track_midterm_to_final_improvement(&records, &state.config.score_fields);
    ok(&req.id, json!(report))
}

fn handle_attendance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let threshold = match optional_f64(req, "threshold") {
        Ok(v) => v.unwrap_or(DEFAULT_ATTENDANCE_THRESHOLD),
        Err(e) => return e,
    };
    let report = correlate_attendance_and_grades(&records, &state.config.score_fields, threshold);
    ok(&req.id, json!(report))
}

fn handle_hardest_topic(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report = find_hardest_topic(&records, &state.config.score_fields);
    ok(&req.id, json!(report))
}

fn handle_compare_sections(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match roster(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report = compare_sections(roster, &state.config.score_fields);
    ok(&req.id, json!(report))
}

fn handle_at_risk(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let cutoff = match optional_f64(req, "cutoff") {
        Ok(v) => v.unwrap_or(state.config.thresholds.at_risk),
        Err(e) => return e,
    };
    let students = get_at_risk_students(&records, cutoff);
    ok(
        &req.id,
        json!({
            "cutoff": cutoff,
            "count": students.len(),
            "students": students,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "insights.improvement" => Some(handle_improvement(state, req)),
        "insights.attendance" => Some(handle_attendance(state, req)),
        "insights.hardestTopic" => Some(handle_hardest_topic(state, req)),
        "insights.compareSections" => Some(handle_compare_sections(state, req)),
        "insights.atRisk" => Some(handle_at_risk(state, req)),
        _ => None,
    }
}
