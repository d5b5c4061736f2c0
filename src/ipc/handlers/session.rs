use serde_json::json;

use super::required_str;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::{authenticate, Session};

fn session_json(session: &Session) -> serde_json::Value {
    json!({
        "name": session.name,
        "role": session.role.as_str(),
        "canDelete": session.role.can_delete(),
    })
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match authenticate(&name, &password) {
        Ok(session) => {
            if let Err(e) = db::save_session(conn, &session) {
                return err(&req.id, "db_update_failed", format!("{e:?}"), None);
            }
            tracing::info!(name = %session.name, role = session.role.as_str(), "login");
            state.session = session;
            ok(&req.id, session_json(&state.session))
        }
        Err(e) => err(&req.id, "auth_failed", e.to_string(), None),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if let Err(e) = db::clear_session(conn) {
        return err(&req.id, "db_update_failed", format!("{e:?}"), None);
    }
    state.session = Session::default();
    ok(&req.id, session_json(&state.session))
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_json(&state.session))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.current" => Some(handle_current(state, req)),
        _ => None,
    }
}
