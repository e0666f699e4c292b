use serde_json::json;
use thiserror::Error;

/// Structural failures raised by the analytics engine and the roster.
///
/// Missing *values* are never errors; only a key absent from a record's
/// score map, a weight vector of the wrong shape, or a curve over a set with
/// nothing to scale.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("student {student_id} has no '{field}' field")]
    MissingField { student_id: String, field: String },

    /// `block` is `"column"` for the whole weight vector or `"quiz"` for the
    /// quiz block.
    #[error("{block} weights cover {weights} columns but the score matrix has {columns}")]
    ShapeMismatch {
        block: &'static str,
        weights: usize,
        columns: usize,
    },

    #[error("cannot {operation}: {reason}")]
    DegenerateInput {
        operation: &'static str,
        reason: String,
    },

    #[error("student {0} already exists")]
    DuplicateStudent(String),

    #[error("student {0} not found")]
    UnknownStudent(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn missing_field(student_id: &str, field: &str) -> Self {
        EngineError::MissingField {
            student_id: student_id.to_string(),
            field: field.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MissingField { .. } => "missing_field",
            EngineError::ShapeMismatch { .. } => "shape_mismatch",
            EngineError::DegenerateInput { .. } => "degenerate_input",
            EngineError::DuplicateStudent(_) => "duplicate_student",
            EngineError::UnknownStudent(_) => "not_found",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            EngineError::MissingField { student_id, field } => Some(json!({
                "studentId": student_id,
                "field": field,
            })),
            EngineError::ShapeMismatch {
                block,
                weights,
                columns,
            } => Some(json!({
                "block": block,
                "weights": weights,
                "columns": columns,
            })),
            EngineError::DegenerateInput { operation, .. } => Some(json!({
                "operation": operation,
            })),
            EngineError::DuplicateStudent(id) | EngineError::UnknownStudent(id) => {
                Some(json!({ "studentId": id }))
            }
        }
    }
}
