use crate::ipc::error::{engine_err, err};
use crate::ipc::types::{AppState, Request};
use gradebookd::calc::compute_weighted_grades;
use gradebookd::matrix::compute_weighted_grades_vectorized;
use gradebookd::{EngineConfig, EngineResult, Roster, StudentRecord};

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a string", key), None)),
    }
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing number {}", key), None))
}

pub fn optional_f64(req: &Request, key: &str) -> Result<Option<f64>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a number", key), None)),
    }
}

pub fn optional_bool(req: &Request, key: &str) -> Result<Option<bool>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a boolean", key), None)),
    }
}

pub fn roster<'a>(state: &'a AppState, req: &Request) -> Result<&'a Roster, serde_json::Value> {
    state
        .roster
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_roster", "import a roster first", None))
}

pub fn roster_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut Roster, serde_json::Value> {
    state
        .roster
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_roster", "import a roster first", None))
}

/// Records in scope: the whole roster, or one section when `params.section`
/// is given. An unknown section is an error rather than an empty set.
pub fn scoped_records(
    state: &AppState,
    req: &Request,
) -> Result<Vec<StudentRecord>, serde_json::Value> {
    let roster = roster(state, req)?;
    match optional_str(req, "section")? {
        None => Ok(roster.records().to_vec()),
        Some(section) => {
            if !roster.section_names().contains(&section.as_str()) {
                return Err(err(
                    &req.id,
                    "not_found",
                    format!("section not found: {}", section),
                    None,
                ));
            }
            Ok(roster.section_records(&section))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeEngine {
    Scalar,
    Vectorized,
}

impl GradeEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            GradeEngine::Scalar => "scalar",
            GradeEngine::Vectorized => "vectorized",
        }
    }

    pub fn grade(
        self,
        records: &[StudentRecord],
        cfg: &EngineConfig,
    ) -> EngineResult<Vec<StudentRecord>> {
        match self {
            GradeEngine::Scalar => {
                compute_weighted_grades(records, &cfg.grade_weights, &cfg.score_fields)
            }
            GradeEngine::Vectorized => {
                compute_weighted_grades_vectorized(records, &cfg.grade_weights, &cfg.score_fields)
            }
        }
    }
}

pub fn parse_engine(req: &Request) -> Result<GradeEngine, serde_json::Value> {
    match optional_str(req, "engine")?.as_deref() {
        None | Some("scalar") => Ok(GradeEngine::Scalar),
        Some("vectorized") => Ok(GradeEngine::Vectorized),
        Some(other) => Err(err(
            &req.id,
            "bad_params",
            format!("engine must be 'scalar' or 'vectorized', got '{}'", other),
            None,
        )),
    }
}

/// Grades one record with the active configuration.
pub fn grade_one(
    state: &AppState,
    req: &Request,
    record: &StudentRecord,
) -> Result<StudentRecord, serde_json::Value> {
    GradeEngine::Scalar
        .grade(std::slice::from_ref(record), &state.config)
        .map_err(|e| engine_err(&req.id, e))?
        .pop()
        .ok_or_else(|| err(&req.id, "internal", "grade pass returned no record", None))
}

pub fn parse_student(req: &Request) -> Result<StudentRecord, serde_json::Value> {
    let Some(raw) = req.params.get("student") else {
        return Err(err(&req.id, "bad_params", "missing student", None));
    };
    serde_json::from_value::<StudentRecord>(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("student is not a valid record: {}", e),
            None,
        )
    })
}
