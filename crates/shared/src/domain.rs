use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Raw,
    Processed,
}

impl InputType {
    pub const ALL: [InputType; 2] = [InputType::Raw, InputType::Processed];

    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Raw => "raw",
            InputType::Processed => "processed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputType::Raw => "Raw File",
            InputType::Processed => "Processed File",
        }
    }

    /// Value sent in the `input_type` form field; unset goes out as an empty string.
    pub fn wire_value(input_type: Option<InputType>) -> &'static str {
        input_type.map(InputType::as_str).unwrap_or("")
    }
}

impl FromStr for InputType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "raw" => Ok(InputType::Raw),
            "processed" => Ok(InputType::Processed),
            other => Err(UnknownVariant {
                kind: "input type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    #[default]
    Pipeline,
    Custom,
}

impl ProcessingMode {
    pub fn label(self) -> &'static str {
        match self {
            ProcessingMode::Pipeline => "Sequential Mode",
            ProcessingMode::Custom => "Custom Mode",
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            ProcessingMode::Pipeline => Endpoint::RunPipeline,
            ProcessingMode::Custom => Endpoint::RunStep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    RunPipeline,
    RunStep,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::RunPipeline => "run_pipeline",
            Endpoint::RunStep => "run_step",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Agent step as offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Summarize,
    Generate,
    Validate,
    Remediate,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 4] = [
        PipelineStep::Summarize,
        PipelineStep::Generate,
        PipelineStep::Validate,
        PipelineStep::Remediate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStep::Summarize => "summarize",
            PipelineStep::Generate => "generate",
            PipelineStep::Validate => "validate",
            PipelineStep::Remediate => "remediate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStep::Summarize => "Only Summarize",
            PipelineStep::Generate => "Only Generate NFRs",
            PipelineStep::Validate => "Only Validate",
            PipelineStep::Remediate => "Only Remediate",
        }
    }

    /// Step name expected by the `run_step` endpoint.
    pub fn api_step_name(self) -> &'static str {
        match self {
            PipelineStep::Summarize => "summarize",
            PipelineStep::Generate => "generate_nfr_rules",
            PipelineStep::Validate => "validate_compliance",
            PipelineStep::Remediate => "remediate",
        }
    }
}

impl FromStr for PipelineStep {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PipelineStep::ALL
            .into_iter()
            .find(|step| step.as_str() == value)
            .ok_or_else(|| UnknownVariant {
                kind: "agent step",
                value: value.to_string(),
            })
    }
}
