use serde_json::json;
use std::path::PathBuf;

use crate::db;
use crate::geo::Geofence;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let geofence = match req.params.get("geofence") {
        None | Some(serde_json::Value::Null) => Geofence::default(),
        Some(v) => match serde_json::from_value::<Geofence>(v.clone()) {
            Ok(g) => g,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid geofence: {}", e),
                    None,
                )
            }
        },
    };

    match db::open_db(&path) {
        Ok(conn) => {
            // Malformed persisted blobs load as defaults; a broken row read is
            // still a hard failure.
            let store = match db::load_store(&conn) {
                Ok(s) => s,
                Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
            };
            let session = match db::load_session(&conn) {
                Ok(s) => s,
                Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
            };
            tracing::info!(
                workspace = %path.display(),
                courses = store.courses().len(),
                role = session.role.as_str(),
                "workspace opened"
            );
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.store = store;
            state.session = session;
            state.geofence = geofence;
            state.edit_slot = None;
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
