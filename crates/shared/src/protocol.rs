use serde::{Deserialize, Serialize};

/// Multipart field names understood by the analysis service.
pub mod fields {
    pub const FILE: &str = "file";
    pub const INPUT_TYPE: &str = "input_type";
    pub const POLICY: &str = "policy";
    pub const STEP: &str = "step";
}

/// Body returned by `run_pipeline` and `run_step`. Every key is optional and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfr_rules: Option<Vec<NfrRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_results: Option<Vec<ComplianceResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_actions: Option<Vec<String>>,
}

impl AnalysisResult {
    /// True when no key was present at all.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.nfr_rules.is_none()
            && self.compliance_results.is_none()
            && self.remediation_actions.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NfrRule {
    Text(String),
    Structured { rule: String },
}

impl NfrRule {
    pub fn text(&self) -> &str {
        match self {
            NfrRule::Text(text) => text,
            NfrRule::Structured { rule } => rule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub rule: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}
