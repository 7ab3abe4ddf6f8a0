use super::*;

fn decode(body: &str) -> AnalysisResult {
    serde_json::from_str(body).expect("decode result")
}

#[test]
fn renders_sections_in_fixed_order_and_skips_empty_lists() {
    let result = decode(
        r#"{
            "remediation_actions": [],
            "compliance_results": [{"rule": "R1", "status": "pass"}],
            "nfr_rules": ["R1"],
            "summary": "ok"
        }"#,
    );

    let sections = render_sections(&result, false);

    let titles: Vec<_> = sections.iter().map(ResultSection::title).collect();
    assert_eq!(titles, vec!["Summary", "NFR Rules", "Compliance Results"]);
    assert_eq!(sections[1].lines(), vec!["R1".to_string()]);
    assert_eq!(sections[2].lines(), vec!["R1 – pass".to_string()]);
}

#[test]
fn matched_reference_only_on_entries_that_have_one() {
    let result = decode(
        r#"{"compliance_results": [
            {"rule": "R2", "status": "fail", "matched_with": "P3", "score": 0.82},
            {"rule": "R3", "status": "pass", "score": 0.4}
        ]}"#,
    );

    let sections = render_sections(&result, false);

    assert_eq!(sections.len(), 1);
    assert_eq!(
        sections[0].lines(),
        vec![
            "R2 – fail (Matched with: P3, Score: 0.82)".to_string(),
            "R3 – pass".to_string(),
        ]
    );
}

#[test]
fn matched_reference_without_score_shows_placeholder() {
    let result = decode(
        r#"{"compliance_results": [{"rule": "R4", "status": "partial", "matched_with": "P1"}]}"#,
    );
    let sections = render_sections(&result, false);
    assert_eq!(
        sections[0].lines(),
        vec!["R4 – partial (Matched with: P1, Score: n/a)".to_string()]
    );
}

#[test]
fn empty_matched_name_is_not_a_match() {
    let result = decode(
        r#"{"compliance_results": [{"rule": "R1", "status": "pass", "matched_with": "", "score": 0.5}]}"#,
    );
    let sections = render_sections(&result, false);
    assert_eq!(sections[0].lines(), vec!["R1 – pass".to_string()]);
}

#[test]
fn structured_rules_render_their_rule_field() {
    let result = decode(r#"{"nfr_rules": [{"rule": "Latency under 200ms"}, "Encrypt at rest"]}"#);
    let sections = render_sections(&result, false);
    assert_eq!(
        sections,
        vec![ResultSection::NfrRules(vec![
            "Latency under 200ms".to_string(),
            "Encrypt at rest".to_string(),
        ])]
    );
}

#[test]
fn empty_summary_is_not_rendered() {
    let result = decode(r#"{"summary": "", "remediation_actions": ["Add MFA"]}"#);
    let sections = render_sections(&result, false);
    assert_eq!(
        sections,
        vec![ResultSection::RemediationSuggestions(vec![
            "Add MFA".to_string()
        ])]
    );
}

#[test]
fn nothing_renders_while_loading() {
    let result = decode(r#"{"summary": "stale"}"#);
    assert!(render_sections(&result, true).is_empty());

    let mut state = FormState::new();
    state.output = result;
    state.loading = true;
    assert!(render_form(&state).is_empty());
}

#[test]
fn empty_result_renders_nothing() {
    assert!(render_sections(&AnalysisResult::default(), false).is_empty());
}

#[test]
fn plain_format_lists_titles_and_entries() {
    let result = decode(r#"{"summary": "ok", "remediation_actions": ["Rotate keys", "Add audit log"]}"#);
    let text = format_plain(&render_sections(&result, false));
    assert_eq!(
        text,
        "== Summary ==\nok\n\n== Remediation Suggestions ==\nRotate keys\nAdd audit log\n"
    );
}
