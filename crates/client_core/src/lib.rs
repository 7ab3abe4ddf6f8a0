use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use shared::{
    domain::Endpoint,
    error::{ApiError, ErrorCode},
    protocol::{fields, AnalysisResult},
};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

pub mod config;
pub mod form;
pub mod render;

pub use config::{load_settings, ClientSettings};
pub use form::{reduce, DocumentRef, FormAction, FormEffect, FormState, SubmissionRequest};
pub use render::{render_form, render_sections, ResultSection};

const ERROR_BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid service url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to read {filename}: {source}")]
    ReadDocument {
        filename: String,
        source: std::io::Error,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: Endpoint,
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
        body: String,
    },
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: Endpoint,
        source: serde_json::Error,
    },
}

impl SubmitError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SubmitError::InvalidUrl { .. } => ErrorCode::Validation,
            SubmitError::ReadDocument { .. } => ErrorCode::LocalFile,
            SubmitError::Transport { .. } => ErrorCode::Unreachable,
            SubmitError::Status { .. } => ErrorCode::Rejected,
            SubmitError::Decode { .. } => ErrorCode::MalformedResponse,
        }
    }
}

impl From<&SubmitError> for ApiError {
    fn from(value: &SubmitError) -> Self {
        ApiError::new(value.code(), value.to_string())
    }
}

/// Seam between the form and the analysis service.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<AnalysisResult, SubmitError>;
}

#[derive(Debug, Clone)]
pub struct SubmissionClient {
    http: Client,
    base_url: Url,
}

impl SubmissionClient {
    pub fn new(base_url: &str) -> Result<Self, SubmitError> {
        Ok(Self {
            http: Client::new(),
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: parse_base_url(&settings.api_base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(endpoint.path());
        }
        url
    }

    async fn document_part(endpoint: Endpoint, document: &DocumentRef) -> Result<Part, SubmitError> {
        let bytes = tokio::fs::read(&document.path)
            .await
            .map_err(|source| SubmitError::ReadDocument {
                filename: document.filename.clone(),
                source,
            })?;
        let mime = mime_guess::from_path(&document.filename).first_or_octet_stream();
        Part::bytes(bytes)
            .file_name(document.filename.clone())
            .mime_str(mime.essence_str())
            .map_err(|source| SubmitError::Transport { endpoint, source })
    }

    pub async fn build_form(request: &SubmissionRequest) -> Result<Form, SubmitError> {
        let mut form = Form::new()
            .part(fields::FILE, Self::document_part(request.endpoint, &request.document).await?)
            .text(fields::INPUT_TYPE, request.input_type_value());
        if let Some(policy) = &request.policy {
            form = form.part(fields::POLICY, Self::document_part(request.endpoint, policy).await?);
        }
        if let Some(step) = request.step_name() {
            form = form.text(fields::STEP, step);
        }
        Ok(form)
    }
}

#[async_trait]
impl AnalysisApi for SubmissionClient {
    async fn submit(&self, request: &SubmissionRequest) -> Result<AnalysisResult, SubmitError> {
        let endpoint = request.endpoint;
        let url = self.endpoint_url(endpoint);
        let form = Self::build_form(request).await?;

        info!(
            submission = request.id.0,
            %endpoint,
            document = %request.document.filename,
            has_policy = request.policy.is_some(),
            step = request.step_name().unwrap_or(""),
            "submitting document"
        );

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| SubmitError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                endpoint,
                status,
                body: excerpt(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| SubmitError::Transport { endpoint, source })?;
        serde_json::from_slice(&bytes).map_err(|source| SubmitError::Decode { endpoint, source })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, SubmitError> {
    let normalized = config::normalize_base_url(raw);
    Url::parse(&normalized).map_err(|source| SubmitError::InvalidUrl {
        url: normalized.clone(),
        source,
    })
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Runs one dispatched request and turns the outcome into the action that
/// completes it. Failures are logged here; the form only keeps the summary.
pub async fn run_submission(api: &dyn AnalysisApi, request: SubmissionRequest) -> FormAction {
    let id = request.id;
    match api.submit(&request).await {
        Ok(result) => {
            info!(submission = id.0, endpoint = %request.endpoint, "submission completed");
            FormAction::SubmissionSucceeded { id, result }
        }
        Err(err) => {
            error!(submission = id.0, endpoint = %request.endpoint, "submission failed: {err}");
            FormAction::SubmissionFailed {
                id,
                error: ApiError::from(&err),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
