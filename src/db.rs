use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::session::Session;
use crate::store::AttendanceStore;

pub const KEY_RECORDS: &str = "attendanceRecords";
pub const KEY_CURRENT_USER: &str = "currentUser";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("register.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn kv_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(value)
}

pub fn kv_set(conn: &Connection, key: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO kv_store(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

pub fn kv_delete(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?", [key])?;
    Ok(())
}

/// Malformed or missing persisted JSON loads as an empty store.
pub fn load_store(conn: &Connection) -> anyhow::Result<AttendanceStore> {
    let Some(raw) = kv_get(conn, KEY_RECORDS)? else {
        return Ok(AttendanceStore::new());
    };
    let value = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(v) => v,
        Err(_) => return Ok(AttendanceStore::new()),
    };
    Ok(AttendanceStore::from_value(&value))
}

pub fn save_store(conn: &Connection, store: &AttendanceStore) -> anyhow::Result<()> {
    kv_set(conn, KEY_RECORDS, &store.to_value().to_string())
}

pub fn load_session(conn: &Connection) -> anyhow::Result<Session> {
    let Some(raw) = kv_get(conn, KEY_CURRENT_USER)? else {
        return Ok(Session::default());
    };
    let value = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(v) => v,
        Err(_) => return Ok(Session::default()),
    };
    Ok(Session::from_value(&value))
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    kv_set(conn, KEY_CURRENT_USER, &session.to_value().to_string())
}

pub fn clear_session(conn: &Connection) -> anyhow::Result<()> {
    kv_delete(conn, KEY_CURRENT_USER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::store::Status;

    fn temp_workspace(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn store_roundtrips_through_kv() {
        let ws = temp_workspace("registerd-db-store");
        let conn = open_db(&ws).unwrap();
        let mut store = AttendanceStore::new();
        store
            .add_entry("Math", "Ada", "S1", "01-09-2025", Status::Present)
            .unwrap();
        save_store(&conn, &store).unwrap();
        let loaded = load_store(&conn).unwrap();
        assert_eq!(loaded.courses(), vec!["Math"]);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn corrupt_records_blob_falls_back_to_empty() {
        let ws = temp_workspace("registerd-db-corrupt");
        let conn = open_db(&ws).unwrap();
        kv_set(&conn, KEY_RECORDS, "{not json").unwrap();
        assert!(load_store(&conn).unwrap().is_empty());
        kv_set(&conn, KEY_CURRENT_USER, "[]").unwrap();
        assert_eq!(load_session(&conn).unwrap(), Session::default());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn session_persists_until_cleared() {
        let ws = temp_workspace("registerd-db-session");
        let conn = open_db(&ws).unwrap();
        let session = crate::session::authenticate("Abdulkareem", "lecturer").unwrap();
        save_session(&conn, &session).unwrap();
        assert_eq!(load_session(&conn).unwrap().role, Role::Lecturer);
        clear_session(&conn).unwrap();
        assert_eq!(load_session(&conn).unwrap(), Session::default());
        let _ = std::fs::remove_dir_all(ws);
    }
}
