use serde_json::json;

use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Wire code for a record-store failure.
pub fn store_error_code(e: &StoreError) -> &'static str {
    match e {
        StoreError::MissingField { .. } | StoreError::BadDate { .. } => "validation",
        StoreError::Duplicate { .. } => "duplicate",
        StoreError::NotFound { .. } => "not_found",
    }
}

pub fn store_err(id: &str, e: &StoreError) -> serde_json::Value {
    err(id, store_error_code(e), e.to_string(), None)
}
