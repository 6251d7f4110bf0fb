//! Server-reported errors.
//!
//! A response with status [`ERROR_STATUS`] carries a single row
//! `code;name;message;` instead of data rows.

use crate::bind::{FieldSpec, Record, Setter};

/// HTTP status that marks the body as an error row.
pub const ERROR_STATUS: u16 = 400;

/// Error code for an expired or unknown session.
pub const CODE_INVALID_SESSION: i32 = 1015;

/// A well-formed `{code, name, message}` error row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerError {
    pub code: i32,
    pub name: String,
    pub message: String,
}

impl ServerError {
    pub fn is_session_expired(&self) -> bool {
        self.code == CODE_INVALID_SESSION
    }
}

impl Record for ServerError {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec::new("code", Setter::I32(|r, v| r.code = v)),
        FieldSpec::new("name", Setter::Str(|r, v| r.name = v)),
        FieldSpec::new("message", Setter::Str(|r, v| r.message = v)),
    ];
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.code, self.message)
    }
}

impl std::error::Error for ServerError {}
