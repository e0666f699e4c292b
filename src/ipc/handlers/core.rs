use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use gradebookd::EngineConfig;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "configPath": state.config_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            "studentCount": state.roster.as_ref().map(|r| r.len()),
            "serverTime": chrono::Utc::now().to_rfc3339(),
        }),
    )
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    match EngineConfig::load(&path) {
        Ok(cfg) => {
            info!(path = %path.display(), "config loaded");
            state.config = cfg;
            state.config_path = Some(path.clone());
            ok(
                &req.id,
                json!({
                    "configPath": path.to_string_lossy(),
                    "config": state.config,
                }),
            )
        }
        Err(e) => err(&req.id, "config_load_failed", format!("{e:#}"), None),
    }
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "configPath": state.config_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            "config": state.config,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.load" => Some(handle_config_load(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        _ => None,
    }
}
