use serde_json::json;

use super::course_filter;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{parse_date, today};
use crate::summary::summarize;

fn handle_daily(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    let date = match req.params.get("date").and_then(|v| v.as_str()) {
        Some(d) => {
            let d = d.trim().to_string();
            if parse_date(&d).is_err() {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid date '{}': expected DD-MM-YYYY", d),
                    None,
                );
            }
            d
        }
        None => today(),
    };
    let filter = course_filter(req);

    match summarize(&state.store, &date, filter.as_deref()) {
        None => ok(&req.id, json!({ "date": date, "noRecords": true })),
        Some(rows) => {
            let rows_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|(course, counts)| {
                    json!({
                        "course": course,
                        "Present": counts.present,
                        "Absent": counts.absent,
                        "Excused": counts.excused,
                    })
                })
                .collect();
            ok(&req.id, json!({ "date": date, "rows": rows_json }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "summary.daily" => Some(handle_daily(state, req)),
        _ => None,
    }
}
