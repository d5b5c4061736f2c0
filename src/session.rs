use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Classrep,
    Lecturer,
}

impl Role {
    pub fn can_delete(self) -> bool {
        matches!(self, Role::Classrep | Role::Lecturer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Classrep => "classrep",
            Role::Lecturer => "lecturer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub role: Role,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            name: "Guest".to_string(),
            role: Role::Student,
        }
    }
}

impl Session {
    /// Parse the persisted `currentUser` blob; anything malformed falls back
    /// to the default guest session.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid name or password")]
pub struct AuthError;

struct Credential {
    name: &'static str,
    password: &'static str,
    role: Role,
}

// Lecturers and class reps. Plaintext on purpose: this register has no real
// authentication story, the login only gates delete buttons in the UI.
const CREDENTIALS: &[Credential] = &[
    Credential {
        name: "Abdulrahmon",
        password: "classrep",
        role: Role::Classrep,
    },
    Credential {
        name: "Abdulkareem",
        password: "lecturer",
        role: Role::Lecturer,
    },
];

/// Name matches case-insensitively, password case-sensitively; both trimmed.
pub fn authenticate(name: &str, password: &str) -> Result<Session, AuthError> {
    let name = name.trim();
    let password = password.trim();
    CREDENTIALS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name) && c.password == password)
        .map(|c| Session {
            name: c.name.to_string(),
            role: c.role,
        })
        .ok_or(AuthError)
}
