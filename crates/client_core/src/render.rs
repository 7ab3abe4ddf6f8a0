//! Projection of an [`AnalysisResult`] into the sections shown to the user.

use std::fmt::Write as _;

use serde::Serialize;
use shared::protocol::{AnalysisResult, ComplianceResult, NfrRule};

use crate::form::FormState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", content = "entries", rename_all = "snake_case")]
pub enum ResultSection {
    Summary(String),
    NfrRules(Vec<String>),
    ComplianceResults(Vec<ComplianceLine>),
    RemediationSuggestions(Vec<String>),
}

impl ResultSection {
    pub fn title(&self) -> &'static str {
        match self {
            ResultSection::Summary(_) => "Summary",
            ResultSection::NfrRules(_) => "NFR Rules",
            ResultSection::ComplianceResults(_) => "Compliance Results",
            ResultSection::RemediationSuggestions(_) => "Remediation Suggestions",
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            ResultSection::Summary(text) => vec![text.clone()],
            ResultSection::NfrRules(rules) => rules.clone(),
            ResultSection::ComplianceResults(lines) => {
                lines.iter().map(ComplianceLine::text).collect()
            }
            ResultSection::RemediationSuggestions(actions) => actions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceLine {
    pub rule: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchedReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedReference {
    pub name: String,
    pub score: Option<f64>,
}

impl ComplianceLine {
    fn from_result(result: &ComplianceResult) -> Self {
        Self {
            rule: result.rule.clone(),
            status: result.status.clone(),
            matched: result
                .matched_with
                .as_ref()
                .filter(|name| !name.is_empty())
                .map(|name| MatchedReference {
                    name: name.clone(),
                    score: result.score,
                }),
        }
    }

    pub fn verdict(&self) -> String {
        format!("{} – {}", self.rule, self.status)
    }

    pub fn matched_text(&self) -> Option<String> {
        self.matched.as_ref().map(|matched| {
            let score = matched
                .score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "n/a".to_string());
            format!("(Matched with: {}, Score: {score})", matched.name)
        })
    }

    pub fn text(&self) -> String {
        match self.matched_text() {
            Some(matched) => format!("{} {matched}", self.verdict()),
            None => self.verdict(),
        }
    }
}

/// Sections in display order. Nothing renders while a submission is loading.
pub fn render_sections(result: &AnalysisResult, loading: bool) -> Vec<ResultSection> {
    if loading {
        return Vec::new();
    }

    let mut sections = Vec::new();

    if let Some(summary) = result.summary.as_ref().filter(|s| !s.is_empty()) {
        sections.push(ResultSection::Summary(summary.clone()));
    }
    if let Some(rules) = result.nfr_rules.as_ref().filter(|r| !r.is_empty()) {
        sections.push(ResultSection::NfrRules(
            rules.iter().map(NfrRule::text).map(str::to_string).collect(),
        ));
    }
    if let Some(verdicts) = result.compliance_results.as_ref().filter(|v| !v.is_empty()) {
        sections.push(ResultSection::ComplianceResults(
            verdicts.iter().map(ComplianceLine::from_result).collect(),
        ));
    }
    if let Some(actions) = result
        .remediation_actions
        .as_ref()
        .filter(|a| !a.is_empty())
    {
        sections.push(ResultSection::RemediationSuggestions(actions.clone()));
    }

    sections
}

pub fn render_form(state: &FormState) -> Vec<ResultSection> {
    render_sections(&state.output, state.loading)
}

pub fn format_plain(sections: &[ResultSection]) -> String {
    let mut out = String::new();
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "== {} ==", section.title());
        for line in section.lines() {
            let _ = writeln!(out, "{line}");
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
