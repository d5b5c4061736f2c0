use chrono::Local;
use serde_json::json;

use super::course_filter;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{parse_date, today};
use crate::summary::summarize;

const RECORD_HEAD: [&str; 4] = ["Name", "Matric No", "Date", "Status"];
const SUMMARY_HEAD: [&str; 4] = ["Course", "Present", "Absent", "Excused"];

/// Document model for the PDF the UI renders: one table per filtered course,
/// then the daily summary for the selected date. The daemon produces the
/// model only; layout and bytes belong to the presentation layer.
fn handle_attendance_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    let filter = course_filter(req);
    let summary_date = match req.params.get("summaryDate").and_then(|v| v.as_str()) {
        Some(d) => {
            let d = d.trim().to_string();
            if parse_date(&d).is_err() {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid summaryDate '{}': expected DD-MM-YYYY", d),
                    None,
                );
            }
            d
        }
        None => today(),
    };

    let now = Local::now();
    let generated_at = now.format("%b %-d, %Y - %-I:%M %p").to_string();
    let file_name = now.format("attendance_%Y-%m-%d_%H-%M.pdf").to_string();

    let sections: Vec<serde_json::Value> = state
        .store
        .grouped(filter.as_deref())
        .into_iter()
        .map(|(course, entries)| {
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|e| json!([e.name, e.matric, e.date, e.status.as_str()]))
                .collect();
            json!({
                "course": course,
                "title": format!("{} Student Attendance List - {}", course, generated_at),
                "head": RECORD_HEAD,
                "rows": rows,
            })
        })
        .collect();

    let summary = match summarize(&state.store, &summary_date, filter.as_deref()) {
        None => json!({ "date": summary_date, "noRecords": true }),
        Some(rows) => {
            let rows_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|(course, c)| json!([course, c.present, c.absent, c.excused]))
                .collect();
            json!({
                "date": summary_date,
                "title": format!("Daily Attendance Summary - {}", summary_date),
                "head": SUMMARY_HEAD,
                "rows": rows_json,
            })
        }
    };

    ok(
        &req.id,
        json!({
            "fileName": file_name,
            "generatedAt": generated_at,
            "sections": sections,
            "summary": summary,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.attendanceModel" => Some(handle_attendance_model(state, req)),
        _ => None,
    }
}
