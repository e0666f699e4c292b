//! Grade analytics engine.
//!
//! Pure transformations from student score records to weighted grades,
//! distributions, percentiles, outliers, curves and comparative insights,
//! plus the CSV collaborators that feed and drain them. Every engine function
//! borrows its input and returns new records.

pub mod calc;
pub mod config;
pub mod curve;
pub mod distribution;
pub mod error;
pub mod export;
pub mod ingest;
pub mod insights;
pub mod matrix;
pub mod percentile;
pub mod record;
pub mod roster;

pub use config::{EngineConfig, Thresholds, WeightConfig};
pub use error::{EngineError, EngineResult};
pub use record::{ScoreSchema, StudentRecord};
pub use roster::Roster;
