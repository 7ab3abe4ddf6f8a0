//! Submission form state and its reducer.
//!
//! [`reduce`] is the only way the form changes. It never performs I/O: a
//! submission comes back as a [`FormEffect::Dispatch`] for the caller to run,
//! and the outcome is fed back in as another action.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{Endpoint, InputType, PipelineStep, ProcessingMode, SubmissionId},
    error::ApiError,
    protocol::AnalysisResult,
};
use tracing::debug;

pub const MISSING_STEP_WARNING: &str = "Please select a valid agent step.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    pub path: PathBuf,
}

impl DocumentRef {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Self {
            filename,
            path: path.to_path_buf(),
        }
    }
}

/// Everything the HTTP layer needs for one POST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub id: SubmissionId,
    pub endpoint: Endpoint,
    pub document: DocumentRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<PipelineStep>,
}

impl SubmissionRequest {
    pub fn input_type_value(&self) -> &'static str {
        InputType::wire_value(self.input_type)
    }

    /// `step` form field; only present for `run_step`.
    pub fn step_name(&self) -> Option<&'static str> {
        self.step.map(PipelineStep::api_step_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub document: Option<DocumentRef>,
    pub policy: Option<DocumentRef>,
    pub input_type: Option<InputType>,
    pub mode: ProcessingMode,
    pub step: Option<PipelineStep>,
    pub loading: bool,
    pub output: AnalysisResult,
    pub last_error: Option<ApiError>,
    /// Latest dispatched submission; completions for any other id are dropped.
    pub latest_submission: Option<SubmissionId>,
    #[serde(default)]
    next_submission_id: u64,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn step_required(&self) -> bool {
        self.mode == ProcessingMode::Custom
    }

    fn clear_output(&mut self) {
        self.output = AnalysisResult::default();
    }

    fn allocate_submission_id(&mut self) -> SubmissionId {
        self.next_submission_id += 1;
        SubmissionId(self.next_submission_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    SelectDocument(DocumentRef),
    SelectPolicy(DocumentRef),
    ClearPolicy,
    SetInputType(InputType),
    SetMode(ProcessingMode),
    SetStep(PipelineStep),
    Submit,
    SubmissionSucceeded {
        id: SubmissionId,
        result: AnalysisResult,
    },
    SubmissionFailed {
        id: SubmissionId,
        error: ApiError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEffect {
    Dispatch(SubmissionRequest),
    Warn(String),
}

pub fn reduce(state: &mut FormState, action: FormAction) -> Vec<FormEffect> {
    match action {
        FormAction::SelectDocument(document) => {
            state.document = Some(document);
            state.clear_output();
            Vec::new()
        }
        FormAction::SelectPolicy(policy) => {
            state.policy = Some(policy);
            Vec::new()
        }
        FormAction::ClearPolicy => {
            state.policy = None;
            Vec::new()
        }
        FormAction::SetInputType(input_type) => {
            state.input_type = Some(input_type);
            Vec::new()
        }
        FormAction::SetMode(mode) => {
            state.mode = mode;
            state.clear_output();
            if mode == ProcessingMode::Pipeline {
                state.step = None;
            }
            Vec::new()
        }
        FormAction::SetStep(step) => {
            state.step = Some(step);
            Vec::new()
        }
        FormAction::Submit => submit(state),
        FormAction::SubmissionSucceeded { id, result } => {
            if state.latest_submission != Some(id) {
                debug!(submission = id.0, "dropping stale submission result");
                return Vec::new();
            }
            state.output = result;
            state.last_error = None;
            state.loading = false;
            Vec::new()
        }
        FormAction::SubmissionFailed { id, error } => {
            if state.latest_submission != Some(id) {
                debug!(submission = id.0, "dropping stale submission failure");
                return Vec::new();
            }
            state.clear_output();
            state.last_error = Some(error);
            state.loading = false;
            Vec::new()
        }
    }
}

fn submit(state: &mut FormState) -> Vec<FormEffect> {
    let Some(document) = state.document.clone() else {
        return Vec::new();
    };

    let step = match state.mode {
        ProcessingMode::Pipeline => None,
        ProcessingMode::Custom => match state.step {
            Some(step) => Some(step),
            None => return vec![FormEffect::Warn(MISSING_STEP_WARNING.to_string())],
        },
    };

    let id = state.allocate_submission_id();
    state.latest_submission = Some(id);
    state.loading = true;
    state.last_error = None;

    vec![FormEffect::Dispatch(SubmissionRequest {
        id,
        endpoint: state.mode.endpoint(),
        document,
        policy: state.policy.clone(),
        input_type: state.input_type,
        step,
    })]
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
