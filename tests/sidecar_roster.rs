mod test_support;

use serde_json::json;
use test_support::{
    assert_close, error_code, f64_at, fixture_path, ids, request_err, request_ok, send_raw,
    spawn_sidecar, temp_dir,
};

#[test]
fn health_reports_empty_state_before_import() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert!(health.get("studentCount").map(|v| v.is_null()).unwrap_or(false));

    let e = request_err(&mut stdin, &mut reader, "2", "roster.list", json!({}));
    assert_eq!(error_code(&e), "no_roster");

    let e = request_err(&mut stdin, &mut reader, "3", "nope.method", json!({}));
    assert_eq!(error_code(&e), "not_implemented");
}

#[test]
fn rejected_first_insert_leaves_no_roster() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let scores = json!({
        "quiz1": 90, "quiz2": 90, "quiz3": 90, "quiz4": 90, "quiz5": 90,
        "midterm": 90, "final": 90, "attendance_percent": 90
    });

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "roster.insert",
        json!({ "student": {
            "studentId": "2024-0200", "firstName": "Ina", "lastName": "Blank",
            "section": "", "scores": scores.clone()
        }}),
    );
    assert_eq!(error_code(&e), "missing_field");

    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert!(health.get("studentCount").map(|v| v.is_null()).unwrap_or(false));
    let e = request_err(&mut stdin, &mut reader, "3", "roster.list", json!({}));
    assert_eq!(error_code(&e), "no_roster");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "roster.insert",
        json!({ "student": {
            "studentId": "2024-0200", "firstName": "Ina", "lastName": "Blank",
            "section": "BSIT-2A", "scores": scores
        }}),
    );
    let health = request_ok(&mut stdin, &mut reader, "5", "health", json!({}));
    assert_eq!(health.get("studentCount").and_then(|v| v.as_u64()), Some(1));
}

#[test]
fn malformed_line_gets_bad_json_and_loop_continues() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let resp = send_raw(&mut stdin, &mut reader, "{not json");
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_json")
    );

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("serverTime").is_some());
}

#[test]
fn import_reports_skips_warnings_and_sections() {
    let csv = fixture_path("fixtures/students.csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let import = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importCsv",
        json!({ "path": csv.to_string_lossy() }),
    );
    assert_eq!(import.get("studentCount").and_then(|v| v.as_u64()), Some(7));
    assert_eq!(import.get("skippedRows").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(import.get("engine").and_then(|v| v.as_str()), Some("scalar"));
    let warnings = import
        .get("warnings")
        .and_then(|v| v.as_array())
        .expect("warnings");
    assert_eq!(warnings.len(), 3);
    assert_eq!(
        import.get("sections"),
        Some(&json!(["BSIT-1A", "BSIT-1B"]))
    );

    let list = request_ok(&mut stdin, &mut reader, "2", "roster.list", json!({}));
    let students = list.get("students").and_then(|v| v.as_array()).expect("students");
    let ana = &students[0];
    assert_eq!(ana.get("studentId").and_then(|v| v.as_str()), Some("2024-0001"));
    assert_close(f64_at(ana, "/quizzesAverage"), 65.0);
    assert_close(f64_at(ana, "/weightedGrade"), 80.2);
    assert!(ana.pointer("/scores/quiz3").map(|v| v.is_null()).unwrap_or(false));
    assert_eq!(
        ana.pointer("/extra/email").and_then(|v| v.as_str()),
        Some("ana.reyes@example.edu")
    );

    // Out-of-range and non-numeric cells were nulled, not rejected.
    let gia = students
        .iter()
        .find(|s| s.get("studentId").and_then(|v| v.as_str()) == Some("2024-0007"))
        .expect("gia");
    assert!(gia.pointer("/scores/quiz1").map(|v| v.is_null()).unwrap_or(false));
    assert!(gia.pointer("/scores/quiz2").map(|v| v.is_null()).unwrap_or(false));
    assert_close(f64_at(gia, "/weightedGrade"), 68.6);

    let sections = request_ok(&mut stdin, &mut reader, "3", "sections.list", json!({}));
    assert_eq!(
        sections.pointer("/sections/0/studentIds"),
        Some(&json!(["2024-0001", "2024-0002", "2024-0003"]))
    );
    assert_eq!(
        sections.pointer("/sections/1/studentCount").and_then(|v| v.as_u64()),
        Some(4)
    );
}

#[test]
fn duplicate_ids_in_csv_are_skipped_not_fatal() {
    let csv = temp_dir("gradebookd-dup-import").join("students.csv");
    std::fs::write(
        &csv,
        "student_id,first_name,last_name,section,quiz1,quiz2,quiz3,quiz4,quiz5,\
         midterm,final,attendance_percent\n\
         2024-0001,Ana,Reyes,BSIT-1A,80,90,,70,85,75,88,95\n\
         2024-0001,Ana,Again,BSIT-1B,1,1,1,1,1,1,1,1\n",
    )
    .expect("write csv");

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let import = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importCsv",
        json!({ "path": csv.to_string_lossy() }),
    );
    assert_eq!(import.get("studentCount").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(import.get("skippedRows").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(import.pointer("/warnings/0/line").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(import.get("sections"), Some(&json!(["BSIT-1A"])));
}

#[test]
fn missing_csv_is_import_failed() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importCsv",
        json!({ "path": "/definitely/not/here.csv" }),
    );
    assert_eq!(error_code(&e), "import_failed");

    let e = request_err(&mut stdin, &mut reader, "2", "roster.importCsv", json!({}));
    assert_eq!(error_code(&e), "bad_params");
}

#[test]
fn list_sorts_and_scopes_by_section() {
    let csv = fixture_path("fixtures/students.csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importCsv",
        json!({ "path": csv.to_string_lossy() }),
    );

    let sorted = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.list",
        json!({ "sortBy": "weighted_grade", "reverse": true }),
    );
    let order = ids(&sorted, "/students");
    assert_eq!(order.first().map(|s| s.as_str()), Some("2024-0002"));
    assert_eq!(order.last().map(|s| s.as_str()), Some("2024-0006"));

    let by_name = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "roster.list",
        json!({ "section": "BSIT-1B", "sortBy": "last_name" }),
    );
    assert_eq!(
        ids(&by_name, "/students"),
        vec!["2024-0006", "2024-0004", "2024-0005", "2024-0007"]
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "roster.list",
        json!({ "section": "BSIT-9Z" }),
    );
    assert_eq!(error_code(&e), "not_found");
}

#[test]
fn insert_update_delete_keep_sections_consistent() {
    let csv = fixture_path("fixtures/students.csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importCsv",
        json!({ "path": csv.to_string_lossy() }),
    );

    let scores = json!({
        "quiz1": 100, "quiz2": 100, "quiz3": 100, "quiz4": 100, "quiz5": 100,
        "midterm": 100, "final": 100, "attendance_percent": 100
    });
    let inserted = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.insert",
        json!({ "student": {
            "studentId": "2024-0100", "firstName": "Hana", "lastName": "Diaz",
            "section": "BSIT-1C", "scores": scores.clone()
        }}),
    );
    assert_close(f64_at(&inserted, "/student/weightedGrade"), 100.0);

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "roster.insert",
        json!({ "student": {
            "studentId": "2024-0100", "firstName": "Hana", "lastName": "Diaz",
            "section": "BSIT-1C", "scores": scores.clone()
        }}),
    );
    assert_eq!(error_code(&e), "duplicate_student");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "roster.insert",
        json!({ "student": {
            "studentId": "2024-0101", "firstName": "No", "lastName": "Final",
            "section": "BSIT-1C", "scores": { "quiz1": 90 }
        }}),
    );
    assert_eq!(error_code(&e), "missing_field");
    assert_eq!(
        e.pointer("/details/studentId").and_then(|v| v.as_str()),
        Some("2024-0101")
    );

    // Move the new student into BSIT-1A; BSIT-1C disappears with its last member.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "roster.update",
        json!({ "student": {
            "studentId": "2024-0100", "firstName": "Hana", "lastName": "Diaz",
            "section": "BSIT-1A", "scores": scores
        }}),
    );
    let sections = request_ok(&mut stdin, &mut reader, "6", "sections.list", json!({}));
    let names: Vec<&str> = sections
        .get("sections")
        .and_then(|v| v.as_array())
        .expect("sections")
        .iter()
        .filter_map(|s| s.get("name").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, vec!["BSIT-1A", "BSIT-1B"]);
    assert_eq!(
        sections.pointer("/sections/0/studentCount").and_then(|v| v.as_u64()),
        Some(4)
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "roster.delete",
        json!({ "studentId": "2024-0100" }),
    );
    assert_eq!(deleted.get("studentCount").and_then(|v| v.as_u64()), Some(7));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "roster.delete",
        json!({ "studentId": "2024-0100" }),
    );
    assert_eq!(error_code(&e), "not_found");
}

#[test]
fn vectorized_engine_matches_scalar_grades() {
    let csv = fixture_path("fixtures/students.csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "roster.importCsv",
        json!({ "path": csv.to_string_lossy() }),
    );
    let scalar = request_ok(&mut stdin, &mut reader, "2", "grades.compute", json!({}));
    let vectorized = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.compute",
        json!({ "engine": "vectorized" }),
    );
    assert_eq!(
        vectorized.get("engine").and_then(|v| v.as_str()),
        Some("vectorized")
    );
    assert_eq!(scalar.get("students"), vectorized.get("students"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.compute",
        json!({ "engine": "gpu" }),
    );
    assert_eq!(error_code(&e), "bad_params");
}

#[test]
fn config_load_changes_weights_and_cutoff() {
    let csv = fixture_path("fixtures/students.csv");
    let cfg = fixture_path("fixtures/config.json");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "config.load",
        json!({ "path": "/no/such/config.json" }),
    );
    assert_eq!(error_code(&e), "config_load_failed");

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "config.load",
        json!({ "path": cfg.to_string_lossy() }),
    );
    assert_close(f64_at(&loaded, "/config/thresholds/at_risk"), 70.0);

    let got = request_ok(&mut stdin, &mut reader, "3", "config.get", json!({}));
    assert_eq!(got.get("configPath"), loaded.get("configPath"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "roster.importCsv",
        json!({ "path": csv.to_string_lossy() }),
    );
    let at_risk = request_ok(&mut stdin, &mut reader, "5", "insights.atRisk", json!({}));
    assert_close(f64_at(&at_risk, "/cutoff"), 70.0);
    assert_eq!(
        ids(&at_risk, "/students"),
        vec!["2024-0003", "2024-0006", "2024-0007"]
    );
}
