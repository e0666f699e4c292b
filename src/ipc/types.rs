use std::path::PathBuf;

use gradebookd::{EngineConfig, Roster};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub config: EngineConfig,
    pub config_path: Option<PathBuf>,
    pub roster: Option<Roster>,
}
