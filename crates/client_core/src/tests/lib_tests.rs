use super::*;
use std::{
    env, fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Multipart, State},
    http::StatusCode as HttpStatus,
    response::IntoResponse,
    routing::post,
    Router,
};
use shared::domain::{InputType, PipelineStep, ProcessingMode, SubmissionId};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct ReceivedRequest {
    path: String,
    fields: Vec<ReceivedField>,
}

impl ReceivedRequest {
    fn field(&self, name: &str) -> Option<&ReceivedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(|f| String::from_utf8_lossy(&f.data).into_owned())
    }
}

#[derive(Clone)]
struct ServerState {
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    status: HttpStatus,
    body: &'static str,
}

async fn record_multipart(state: &ServerState, path: &str, mut multipart: Multipart) {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        fields.push(ReceivedField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.received.lock().await.push(ReceivedRequest {
        path: path.to_string(),
        fields,
    });
}

async fn handle_run_pipeline(
    State(state): State<ServerState>,
    multipart: Multipart,
) -> impl IntoResponse {
    record_multipart(&state, "/run_pipeline", multipart).await;
    (
        state.status,
        [("content-type", "application/json")],
        state.body,
    )
}

async fn handle_run_step(
    State(state): State<ServerState>,
    multipart: Multipart,
) -> impl IntoResponse {
    record_multipart(&state, "/run_step", multipart).await;
    (
        state.status,
        [("content-type", "application/json")],
        state.body,
    )
}

async fn spawn_analysis_server(
    status: HttpStatus,
    body: &'static str,
) -> Result<(String, Arc<Mutex<Vec<ReceivedRequest>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        received: Arc::clone(&received),
        status,
        body,
    };
    let app = Router::new()
        .route("/run_pipeline", post(handle_run_pipeline))
        .route("/run_step", post(handle_run_step))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), received))
}

fn temp_document(label: &str, name: &str, contents: &[u8]) -> DocumentRef {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("compliance_client_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("write document");
    DocumentRef::from_path(path)
}

fn pipeline_request(document: DocumentRef) -> SubmissionRequest {
    SubmissionRequest {
        id: SubmissionId(1),
        endpoint: ProcessingMode::Pipeline.endpoint(),
        document,
        policy: None,
        input_type: None,
        step: None,
    }
}

const OK_BODY: &str = r#"{"summary": "ok", "nfr_rules": ["R1"], "compliance_results": [{"rule": "R1", "status": "pass"}], "remediation_actions": []}"#;

#[test]
fn endpoint_urls_append_to_base_path() {
    let client = SubmissionClient::new("http://localhost:8000/").expect("client");
    assert_eq!(
        client.endpoint_url(Endpoint::RunPipeline).as_str(),
        "http://localhost:8000/run_pipeline"
    );

    let nested = SubmissionClient::new("https://gateway.example/compliance").expect("client");
    assert_eq!(
        nested.endpoint_url(Endpoint::RunStep).as_str(),
        "https://gateway.example/compliance/run_step"
    );
}

#[test]
fn rejects_unparseable_base_url() {
    let err = SubmissionClient::new("http://exa mple:notaport").expect_err("invalid url");
    assert_eq!(err.code(), ErrorCode::Validation);
}

#[tokio::test]
async fn pipeline_submission_sends_file_and_input_type() {
    let (server_url, received) = spawn_analysis_server(HttpStatus::OK, OK_BODY)
        .await
        .expect("spawn server");
    let client = SubmissionClient::new(&server_url).expect("client");
    let document = temp_document("pipeline", "brd.pdf", b"%PDF-1.4 brd");
    let mut request = pipeline_request(document);
    request.input_type = Some(InputType::Raw);

    let result = client.submit(&request).await.expect("submit");

    assert_eq!(result.summary.as_deref(), Some("ok"));
    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    let req = &received[0];
    assert_eq!(req.path, "/run_pipeline");
    let file = req.field("file").expect("file field");
    assert_eq!(file.file_name.as_deref(), Some("brd.pdf"));
    assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file.data, b"%PDF-1.4 brd".to_vec());
    assert_eq!(req.text("input_type").as_deref(), Some("raw"));
    assert!(req.field("policy").is_none());
    assert!(req.field("step").is_none());
}

#[tokio::test]
async fn step_submission_sends_policy_and_translated_step() {
    let (server_url, received) = spawn_analysis_server(HttpStatus::OK, "{}")
        .await
        .expect("spawn server");
    let client = SubmissionClient::new(&server_url).expect("client");
    let request = SubmissionRequest {
        id: SubmissionId(4),
        endpoint: ProcessingMode::Custom.endpoint(),
        document: temp_document("step", "brd.txt", b"requirements"),
        policy: Some(temp_document("step_policy", "policy.txt", b"policy text")),
        input_type: None,
        step: Some(PipelineStep::Generate),
    };

    let result = client.submit(&request).await.expect("submit");

    assert!(result.is_empty());
    let received = received.lock().await;
    let req = &received[0];
    assert_eq!(req.path, "/run_step");
    assert_eq!(req.text("input_type").as_deref(), Some(""));
    assert_eq!(req.text("step").as_deref(), Some("generate_nfr_rules"));
    let policy = req.field("policy").expect("policy field");
    assert_eq!(policy.file_name.as_deref(), Some("policy.txt"));
    assert_eq!(policy.data, b"policy text".to_vec());
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let (server_url, _) = spawn_analysis_server(
        HttpStatus::INTERNAL_SERVER_ERROR,
        r#"{"detail": "pipeline crashed"}"#,
    )
    .await
    .expect("spawn server");
    let client = SubmissionClient::new(&server_url).expect("client");
    let request = pipeline_request(temp_document("status", "brd.txt", b"x"));

    let err = client.submit(&request).await.expect_err("server error");

    match &err {
        SubmitError::Status { status, body, .. } => {
            assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("pipeline crashed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::Rejected);
}

#[tokio::test]
async fn malformed_body_maps_to_decode_error() {
    let (server_url, _) = spawn_analysis_server(HttpStatus::OK, "<html>oops</html>")
        .await
        .expect("spawn server");
    let client = SubmissionClient::new(&server_url).expect("client");
    let request = pipeline_request(temp_document("decode", "brd.txt", b"x"));

    let err = client.submit(&request).await.expect_err("decode error");

    assert!(matches!(err, SubmitError::Decode { .. }));
    assert_eq!(err.code(), ErrorCode::MalformedResponse);
}

#[tokio::test]
async fn unreachable_service_maps_to_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = SubmissionClient::new(&format!("http://{addr}")).expect("client");
    let request = pipeline_request(temp_document("transport", "brd.txt", b"x"));

    let err = client.submit(&request).await.expect_err("transport error");

    assert!(matches!(err, SubmitError::Transport { .. }));
}

#[tokio::test]
async fn missing_document_fails_before_sending() {
    let (server_url, received) = spawn_analysis_server(HttpStatus::OK, OK_BODY)
        .await
        .expect("spawn server");
    let client = SubmissionClient::new(&server_url).expect("client");
    let request = pipeline_request(DocumentRef::from_path(PathBuf::from(
        "/nonexistent/compliance/brd.pdf",
    )));

    let err = client.submit(&request).await.expect_err("read error");

    assert!(matches!(err, SubmitError::ReadDocument { .. }));
    assert!(received.lock().await.is_empty());
}

struct FailingApi;

#[async_trait]
impl AnalysisApi for FailingApi {
    async fn submit(&self, request: &SubmissionRequest) -> Result<AnalysisResult, SubmitError> {
        Err(SubmitError::Status {
            endpoint: request.endpoint,
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        })
    }
}

#[tokio::test]
async fn run_submission_reports_failure_as_action() {
    let request = pipeline_request(DocumentRef::from_path("/tmp/brd.pdf"));

    let action = run_submission(&FailingApi, request).await;

    match action {
        FormAction::SubmissionFailed { id, error } => {
            assert_eq!(id, SubmissionId(1));
            assert_eq!(error.code, ErrorCode::Rejected);
            assert!(error.message.contains("502"));
        }
        other => panic!("unexpected action: {other:?}"),
    }
}

#[tokio::test]
async fn full_cycle_through_reducer_and_renderer() {
    let (server_url, _) = spawn_analysis_server(HttpStatus::OK, OK_BODY)
        .await
        .expect("spawn server");
    let client = SubmissionClient::new(&server_url).expect("client");
    let mut state = FormState::new();
    reduce(
        &mut state,
        FormAction::SelectDocument(temp_document("cycle", "brd.md", b"# BRD")),
    );

    let effects = reduce(&mut state, FormAction::Submit);
    let [FormEffect::Dispatch(request)] = effects.as_slice() else {
        panic!("expected dispatch, got {effects:?}");
    };
    assert!(render_form(&state).is_empty());

    let outcome = run_submission(&client, request.clone()).await;
    reduce(&mut state, outcome);

    assert!(!state.loading);
    let titles: Vec<_> = render_form(&state).iter().map(|s| s.title()).collect();
    assert_eq!(titles, vec!["Summary", "NFR Rules", "Compliance Results"]);
}
