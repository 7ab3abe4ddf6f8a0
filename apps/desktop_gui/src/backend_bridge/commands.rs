//! Backend commands queued from UI to backend worker.

use client_core::SubmissionRequest;

pub enum BackendCommand {
    Submit(SubmissionRequest),
    Configure { api_base_url: String },
}
