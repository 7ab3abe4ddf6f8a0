//! UI/backend events and error modeling for the desktop form controller.

use client_core::FormAction;
use shared::error::{ApiError, ErrorCode};

pub enum UiEvent {
    Info(String),
    /// Completion of a dispatched submission, fed straight into the form reducer.
    SubmissionFinished(FormAction),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Service,
    Response,
    LocalFile,
    Validation,
    Unknown,
}

impl UiErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            UiErrorCategory::Transport => "Transport",
            UiErrorCategory::Service => "Service",
            UiErrorCategory::Response => "Response",
            UiErrorCategory::LocalFile => "File",
            UiErrorCategory::Validation => "Validation",
            UiErrorCategory::Unknown => "Unexpected",
        }
    }
}

impl From<ErrorCode> for UiErrorCategory {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Unreachable => UiErrorCategory::Transport,
            ErrorCode::Rejected => UiErrorCategory::Service,
            ErrorCode::MalformedResponse => UiErrorCategory::Response,
            ErrorCode::LocalFile => UiErrorCategory::LocalFile,
            ErrorCode::Validation => UiErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Settings,
    Submission,
}

/// Short, user-facing explanation for a failed submission.
pub fn describe_submission_failure(error: &ApiError) -> String {
    match error.code {
        ErrorCode::Unreachable => {
            let lower = error.message.to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                "The analysis service did not answer in time; retry the submission.".to_string()
            } else {
                "Analysis service unreachable; check the service URL and network.".to_string()
            }
        }
        ErrorCode::Rejected => format!("The analysis service rejected the request: {}", error.message),
        ErrorCode::MalformedResponse => {
            "The analysis service returned a response that could not be read.".to_string()
        }
        ErrorCode::LocalFile => format!("Could not read the selected document: {}", error.message),
        ErrorCode::Validation => format!("Invalid request: {}", error.message),
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_api_error(context: UiErrorContext, error: &ApiError) -> Self {
        Self {
            category: error.code.into(),
            context,
            message: error.message.clone(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_codes_to_categories() {
        let err = UiError::from_api_error(
            UiErrorContext::Submission,
            &ApiError::new(ErrorCode::MalformedResponse, "expected value at line 1"),
        );
        assert_eq!(err.category(), UiErrorCategory::Response);
        assert_eq!(err.context(), UiErrorContext::Submission);
    }

    #[test]
    fn classifies_backend_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::Submission,
            "Backend command processor disconnected (possible startup/runtime failure)",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
    }

    #[test]
    fn classifies_bad_url_as_validation_error() {
        let err = UiError::from_message(
            UiErrorContext::Settings,
            "invalid service url 'http://'",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }

    #[test]
    fn distinguishes_timeouts_from_unreachable_service() {
        let timeout = ApiError::new(ErrorCode::Unreachable, "request to run_step failed: operation timed out");
        let refused = ApiError::new(ErrorCode::Unreachable, "request to run_step failed: connection refused");
        assert!(describe_submission_failure(&timeout).contains("did not answer in time"));
        assert!(describe_submission_failure(&refused).contains("unreachable"));
    }
}
