use serde_json::json;

use super::{course_filter, required_index, required_str};
use crate::db;
use crate::geo::Position;
use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, EditSlot, Request};
use crate::session::Session;
use crate::store::{today, AttendanceEntry, Status};

fn entry_json(index: usize, entry: &AttendanceEntry) -> serde_json::Value {
    json!({
        "index": index,
        "name": entry.name,
        "matric": entry.matric,
        "date": entry.date,
        "status": entry.status.as_str(),
    })
}

fn optional_status(req: &Request, default: Status) -> Result<Status, serde_json::Value> {
    match req.params.get("status").and_then(|v| v.as_str()) {
        None => Ok(default),
        Some(s) => Status::parse(s.trim()).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "status must be one of Present, Absent, Excused",
                None,
            )
        }),
    }
}

fn optional_date(req: &Request, default: String) -> String {
    req.params
        .get("date")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or(default)
}

/// Geofence gate for the self-check-in flow. A failed location lookup is its
/// own signal and is never conflated with being outside the radius; a missing
/// position means the check was skipped.
fn check_geofence(state: &AppState, req: &Request) -> Result<(), serde_json::Value> {
    if let Some(reason) = req.params.get("locationError").and_then(|v| v.as_str()) {
        return Err(err(
            &req.id,
            "location_unavailable",
            format!("location unavailable: {}", reason),
            None,
        ));
    }
    let Some(raw) = req.params.get("position") else {
        return Ok(());
    };
    if raw.is_null() {
        return Ok(());
    }
    let pos: Position = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Err(err(
                &req.id,
                "bad_params",
                format!("invalid position: {}", e),
                None,
            ))
        }
    };
    if !state.geofence.contains(pos) {
        return Err(err(
            &req.id,
            "outside_geofence",
            "submission rejected: outside the attendance area",
            Some(json!({
                "distanceMeters": state.geofence.distance_to(pos),
                "radiusMeters": state.geofence.radius_m,
            })),
        ));
    }
    Ok(())
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let matric = match required_str(req, "matric") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course = match required_str(req, "course") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match optional_status(req, Status::Present) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = optional_date(req, today());

    if let Err(resp) = check_geofence(state, req) {
        return resp;
    }

    if let Err(e) = state.store.add_entry(&course, &name, &matric, &date, status) {
        return store_err(&req.id, &e);
    }
    if let Err(e) = db::save_store(conn, &state.store) {
        return err(&req.id, "db_update_failed", format!("{e:?}"), None);
    }

    // A submission completes an anonymous self-check-in: drop any elevated
    // session back to guest and persist the reset.
    state.session = Session::default();
    if let Err(e) = db::save_session(conn, &state.session) {
        return err(&req.id, "db_update_failed", format!("{e:?}"), None);
    }

    tracing::debug!(%course, %matric, %date, "attendance recorded");
    ok(
        &req.id,
        json!({
            "course": course,
            "entry": { "name": name, "matric": matric, "date": date, "status": status.as_str() },
        }),
    )
}

fn handle_begin_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    let course = match required_str(req, "course") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(entry) = state.store.entry(&course, index) else {
        return err(
            &req.id,
            "not_found",
            format!("no entry at index {} in course '{}'", index, course),
            None,
        );
    };
    let result = json!({
        "course": course,
        "index": index,
        "entry": entry_json(index, entry),
    });
    // Single slot: a second beginEdit replaces the first.
    state.edit_slot = Some(EditSlot { course, index });
    ok(&req.id, result)
}

fn handle_save_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(slot) = state.edit_slot.clone() else {
        return err(&req.id, "validation", "no edit in progress", None);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let matric = match required_str(req, "matric") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(current) = state.store.entry(&slot.course, slot.index).cloned() else {
        state.edit_slot = None;
        return err(
            &req.id,
            "not_found",
            format!("no entry at index {} in course '{}'", slot.index, slot.course),
            None,
        );
    };
    let status = match optional_status(req, current.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Omitted date keeps the entry on its original day.
    let date = optional_date(req, current.date.clone());

    let updated = AttendanceEntry {
        name,
        matric,
        date,
        status,
    };
    if let Err(e) = state.store.edit_entry(&slot.course, slot.index, updated.clone()) {
        return store_err(&req.id, &e);
    }
    if let Err(e) = db::save_store(conn, &state.store) {
        return err(&req.id, "db_update_failed", format!("{e:?}"), None);
    }
    state.edit_slot = None;
    tracing::debug!(course = %slot.course, index = slot.index, "entry edited");
    ok(
        &req.id,
        json!({
            "course": slot.course,
            "index": slot.index,
            "entry": entry_json(slot.index, &updated),
        }),
    )
}

fn handle_cancel_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let had_slot = state.edit_slot.take().is_some();
    ok(&req.id, json!({ "cancelled": had_slot }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if !state.session.role.can_delete() {
        return err(
            &req.id,
            "forbidden",
            "only class reps and lecturers can delete records",
            None,
        );
    }
    let course = match required_str(req, "course") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let removed = match state.store.delete_entry(&course, index) {
        Ok(e) => e,
        Err(e) => return store_err(&req.id, &e),
    };
    // Indices shifted; a pending edit in this course would point at the
    // wrong row.
    if state
        .edit_slot
        .as_ref()
        .map(|s| s.course == course)
        .unwrap_or(false)
    {
        state.edit_slot = None;
    }
    if let Err(e) = db::save_store(conn, &state.store) {
        return err(&req.id, "db_update_failed", format!("{e:?}"), None);
    }
    let course_removed = !state.store.has_course(&course);
    tracing::debug!(%course, index, course_removed, "entry deleted");
    ok(
        &req.id,
        json!({
            "course": course,
            "removed": { "name": removed.name, "matric": removed.matric, "date": removed.date, "status": removed.status.as_str() },
            "courseRemoved": course_removed,
        }),
    )
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    let filter = course_filter(req);
    let courses: Vec<serde_json::Value> = state
        .store
        .grouped(filter.as_deref())
        .into_iter()
        .map(|(course, entries)| {
            // Listing order is matric-sorted; each row carries its stored
            // index so edit/delete still address the right entry.
            let stored = state.store.course_entries(course).unwrap_or(&[]);
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|e| {
                    let idx = stored
                        .iter()
                        .position(|s| s == *e)
                        .expect("listed entry comes from the store");
                    entry_json(idx, e)
                })
                .collect();
            json!({ "course": course, "entries": rows })
        })
        .collect();
    ok(&req.id, json!({ "courses": courses }))
}

fn handle_courses(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    }
    ok(&req.id, json!({ "courses": state.store.courses() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.add" => Some(handle_add(state, req)),
        "attendance.beginEdit" => Some(handle_begin_edit(state, req)),
        "attendance.saveEdit" => Some(handle_save_edit(state, req)),
        "attendance.cancelEdit" => Some(handle_cancel_edit(state, req)),
        "attendance.delete" => Some(handle_delete(state, req)),
        "attendance.list" => Some(handle_list(state, req)),
        "attendance.courses" => Some(handle_courses(state, req)),
        _ => None,
    }
}
