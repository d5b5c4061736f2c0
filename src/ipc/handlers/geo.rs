use serde_json::json;

use crate::geo::Position;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

/// UI preflight: how far is this position from the reference point, and
/// would a submission from there pass the gate.
fn handle_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("position") else {
        return err(&req.id, "bad_params", "missing position", None);
    };
    let pos: Position = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("invalid position: {}", e),
                None,
            )
        }
    };
    ok(
        &req.id,
        json!({
            "distanceMeters": state.geofence.distance_to(pos),
            "radiusMeters": state.geofence.radius_m,
            "within": state.geofence.contains(pos),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "geo.check" => Some(handle_check(state, req)),
        _ => None,
    }
}
