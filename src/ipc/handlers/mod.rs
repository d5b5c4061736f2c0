pub mod attendance;
pub mod core;
pub mod export;
pub mod geo;
pub mod session;
pub mod summary;

use crate::ipc::error::err;
use crate::ipc::types::Request;

/// Required string param, trimmed per the form semantics.
pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_index(req: &Request, key: &str) -> Result<usize, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Optional course filter: absent or "all" means every course.
pub fn course_filter(req: &Request) -> Option<String> {
    req.params
        .get("course")
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "all")
        .map(|s| s.to_string())
}
