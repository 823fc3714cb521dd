use serde::{Deserialize, Serialize};
use shared::{AppError, Result};

/// Envelope returned by the mutating endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleApiResponse {
    pub success: bool,
    pub message: String,
}

impl SimpleApiResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// `?phone=` query used by refresh and delete
#[derive(Debug, Deserialize)]
pub struct PhoneQuery {
    pub phone: Option<String>,
}

/// Trimmed, non-empty value of a required field.
pub fn required(value: Option<&str>, field: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

/// Empty or blank notes are stored as no note.
pub fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
