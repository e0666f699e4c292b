use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{
    grade_one, optional_bool, optional_str, parse_engine, parse_student, required_str, roster,
    roster_mut, scoped_records,
};
use crate::ipc::types::{AppState, Request};
use gradebookd::distribution::sort_students;
use gradebookd::ingest::read_csv_records;
use gradebookd::Roster;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match optional_str(req, "path") {
        Ok(Some(v)) => PathBuf::from(v),
        Ok(None) => match state.config.file_paths.input_csv.as_ref() {
            Some(p) => PathBuf::from(p),
            None => return err(&req.id, "bad_params", "missing path", None),
        },
        Err(e) => return e,
    };
    let engine = match parse_engine(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let report = match read_csv_records(&path, &state.config) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "import_failed", format!("{e:#}"), None),
    };
    let graded = match engine.grade(&report.records, &state.config) {
        Ok(v) => v,
        Err(e) => return engine_err(&req.id, e),
    };
    let roster = match Roster::from_records(graded) {
        Ok(v) => v,
        Err(e) => return engine_err(&req.id, e),
    };

    info!(
        path = %path.display(),
        students = roster.len(),
        sections = roster.section_names().len(),
        engine = engine.as_str(),
        "roster imported"
    );
    let result = json!({
        "path": path.to_string_lossy(),
        "engine": engine.as_str(),
        "studentCount": roster.len(),
        "sections": roster.section_names(),
        "skippedRows": report.skipped_rows,
        "warnings": report.warnings,
    });
    state.roster = Some(roster);
    ok(&req.id, result)
}

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = match scoped_records(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sort_by = match optional_str(req, "sortBy") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let reverse = match optional_bool(req, "reverse") {
        Ok(v) => v.unwrap_or(false),
        Err(e) => return e,
    };
    let rows = match sort_by.as_deref() {
        Some(field) => sort_students(&records, field, reverse),
        None => records,
    };
    ok(&req.id, json!({ "students": rows }))
}

fn handle_roster_insert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match parse_student(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let graded = match grade_one(state, req, &student) {
        Ok(v) => v,
        Err(e) => return e,
    };
    // A rejected first insert must leave the state without a roster.
    let result = match state.roster.as_mut() {
        Some(roster) => roster.insert(graded.clone()),
        None => Roster::from_records(vec![graded.clone()]).map(|roster| {
            state.roster = Some(roster);
        }),
    };
    match result {
        Ok(()) => ok(&req.id, json!({ "student": graded })),
        Err(e) => engine_err(&req.id, e),
    }
}

fn handle_roster_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match parse_student(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let graded = match grade_one(state, req, &student) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roster = match roster_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = roster.update(graded.clone()) {
        return engine_err(&req.id, e);
    }
    ok(&req.id, json!({ "student": graded }))
}

fn handle_roster_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roster = match roster_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match roster.delete(&student_id) {
        Ok(removed) => ok(
            &req.id,
            json!({
                "deleted": removed.student_id,
                "section": removed.section,
                "studentCount": roster.len(),
            }),
        ),
        Err(e) => engine_err(&req.id, e),
    }
}

fn handle_sections_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match roster(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sections = roster
        .sections()
        .into_iter()
        .map(|(name, members)| {
            json!({
                "name": name,
                "studentCount": members.len(),
                "studentIds": members.iter().map(|r| r.student_id.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();
    ok(&req.id, json!({ "sections": sections }))
}

/// Recomputes every grade with the active weights.
fn handle_grades_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let engine = match parse_engine(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let graded = {
        let roster = match roster(state, req) {
            Ok(v) => v,
            Err(e) => return e,
        };
        match engine.grade(roster.records(), &state.config) {
            Ok(v) => v,
            Err(e) => return engine_err(&req.id, e),
        }
    };
    let roster = match roster_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = roster.replace_all(graded) {
        return engine_err(&req.id, e);
    }
    ok(
        &req.id,
        json!({
            "engine": engine.as_str(),
            "studentCount": roster.len(),
            "students": roster.records(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.importCsv" => Some(handle_import_csv(state, req)),
        "roster.list" => Some(handle_roster_list(state, req)),
        "roster.insert" => Some(handle_roster_insert(state, req)),
        "roster.update" => Some(handle_roster_update(state, req)),
        "roster.delete" => Some(handle_roster_delete(state, req)),
        "sections.list" => Some(handle_sections_list(state, req)),
        "grades.compute" => Some(handle_grades_compute(state, req)),
        _ => None,
    }
}
