use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Unreachable,
    Rejected,
    MalformedResponse,
    LocalFile,
}

impl ErrorCode {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCode::Validation => "Validation",
            ErrorCode::Unreachable => "Transport",
            ErrorCode::Rejected => "Service",
            ErrorCode::MalformedResponse => "Response",
            ErrorCode::LocalFile => "File",
        }
    }
}

/// Serializable description of a failed submission, safe to hand to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
