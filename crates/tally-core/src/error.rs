use serde::Deserialize;
use thiserror::Error;

/// The single error kind crossing the data-access boundary. Every variant
/// carries the human-readable message shown in the failure toast.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("task {0} not found")]
    NotFound(i64),

    #[error("backend rejected the request ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Error body shape emitted by the hosted service's query layer. All
/// fields are optional in practice; anything unparsable falls back to the
/// raw response text.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Maps a non-2xx response to a `Service` error, preferring the backend's
/// own message over the raw body.
pub fn error_from_response(status: u16, body: &str) -> BackendError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => match (parsed.message, parsed.code) {
            (Some(message), Some(code)) => format!("{message} ({code})"),
            (Some(message), None) => message,
            (None, Some(code)) => format!("error code {code}"),
            (None, None) => fallback_message(status, body),
        },
        Err(_) => fallback_message(status, body),
    };

    BackendError::Service { status, message }
}

fn fallback_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("http status {status}")
    } else {
        trimmed.to_string()
    }
}
