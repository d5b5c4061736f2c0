use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::geo::Geofence;
use crate::session::Session;
use crate::store::AttendanceStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The single edit slot of the edit workflow. Starting a new edit replaces
/// it; save and cancel clear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSlot {
    pub course: String,
    pub index: usize,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub store: AttendanceStore,
    pub session: Session,
    pub geofence: Geofence,
    pub edit_slot: Option<EditSlot>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            db: None,
            store: AttendanceStore::new(),
            session: Session::default(),
            geofence: Geofence::default(),
            edit_slot: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
