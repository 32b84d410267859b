use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fallback text when the server gives no usable error body.
pub const GENERIC_FAILURE: &str = "request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Maps a non-2xx status and its raw body to an error.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400..=499 => Self::Validation(normalize_error_body(body)),
            _ => Self::Server(normalize_error_body(body)),
        }
    }

    /// `true` when the request never produced a usable HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(err) if !err.is_decode())
    }
}

/// Joins a DRF-style error body into one line.
///
/// `{"name": ["required", "too short"], "detail": "nope"}` becomes
/// `"name: required, too short; detail: nope"`. Anything that is not a JSON
/// object with at least one entry yields [`GENERIC_FAILURE`].
pub fn normalize_error_body(body: &str) -> String {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return GENERIC_FAILURE.to_string();
    };
    if fields.is_empty() {
        return GENERIC_FAILURE.to_string();
    }

    fields
        .iter()
        .map(|(field, value)| format!("{field}: {}", join_messages(value)))
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_messages(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join(", "),
        other => plain(other),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
