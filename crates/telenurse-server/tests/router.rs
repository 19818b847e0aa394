use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use telenurse_bedrock::error::BedrockError;
use telenurse_bedrock::gateway::{BoxFuture, CompletionRequest, LanguageModel};
use telenurse_server::router;
use telenurse_server::state::AppState;
use telenurse_session::SessionManager;
use telenurse_storage::local::FileRepository;
use telenurse_storage::policy::PolicyStore;

const POLICY: &str = "You are a friendly nurse.";

struct ScriptedModel(Mutex<VecDeque<Result<String, BedrockError>>>);

impl ScriptedModel {
    fn new(replies: Vec<Result<String, BedrockError>>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(replies.into())))
    }
}

impl LanguageModel for ScriptedModel {
    fn complete<'a>(
        &'a self,
        _request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        let reply = self
            .0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BedrockError::Invocation("script exhausted".to_string())));
        Box::pin(async move { reply })
    }
}

fn app(replies: Vec<Result<String, BedrockError>>, dir: &tempfile::TempDir) -> Router {
    let session = SessionManager::new(
        ScriptedModel::new(replies),
        Arc::new(FileRepository::new(dir.path().join("records"))),
        POLICY,
    )
    .with_policy_store(PolicyStore::new(dir.path().join("system_prompt.txt")));
    router(AppState::new(session))
}

fn ok(text: &str) -> Result<String, BedrockError> {
    Ok(text.to_string())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![], &dir);

    let (status, body) = call(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn status_starts_out_idle() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![], &dir);

    let (status, body) = call(&app, "GET", "/api/assessment_status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], json!(false));
    assert_eq!(body["phase"], json!("not_started"));
    assert_eq!(body["busy"], json!(false));
    assert_eq!(body["transcript"], json!([]));
}

#[tokio::test]
async fn full_interview_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let extraction = r#"```json
{"symptoms": [{"symptom": "fatigue", "severity_rating": 2,
  "key_indicators": ["a little tired"]}],
 "mood_assessment": "cheerful", "conversation_notes": "Walks daily."}
```"#;
    let app = app(
        vec![ok("Good morning! How are you?"), ok("Glad to hear it."), ok(extraction)],
        &dir,
    );

    let (status, body) = call(
        &app,
        "POST",
        "/api/start_assessment",
        Some(json!({ "patient_id": "P-100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["greeting"]["role"], json!("interviewer"));
    assert_eq!(body["greeting"]["content"], json!("Good morning! How are you?"));

    let (status, body) = call(
        &app,
        "POST",
        "/api/send_message",
        Some(json!({ "message": "Just a little tired today." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["role"], json!("patient"));
    assert_eq!(body["messages"][1]["content"], json!("Glad to hear it."));

    let (_, body) = call(&app, "GET", "/api/assessment_status", None).await;
    assert_eq!(body["phase"], json!("active"));
    assert_eq!(body["patient_id"], json!("P-100"));
    assert_eq!(body["transcript"].as_array().unwrap().len(), 3);

    let (status, body) = call(&app, "POST", "/api/finish_assessment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"]["oncologist_notification_level"], json!("none"));
    assert_eq!(body["assessment"]["symptoms"]["fatigue"]["severity"], json!(2));
    assert_eq!(body["extraction_error"], Value::Null);
    let artifact = body["artifact"].as_str().unwrap().to_string();
    assert!(artifact.starts_with("patient_P-100_assessment_"));

    let (status, body) = call(&app, "GET", "/api/get_saved_assessments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessments"], json!([artifact.clone()]));

    let (status, body) = call(&app, "GET", &format!("/api/assessment/{artifact}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessment"]["patient_id"], json!("P-100"));

    let (status, body) = call(&app, "POST", "/api/reset_assessment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], json!("not_started"));
}

#[tokio::test]
async fn blank_patient_id_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![], &dir);

    let (status, body) = call(
        &app,
        "POST",
        "/api/start_assessment",
        Some(json!({ "patient_id": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("patient_id"));
}

#[tokio::test]
async fn starting_twice_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![ok("Hello!")], &dir);
    let start = json!({ "patient_id": "P-1", "language": "zh", "input_mode": "speech" });

    let (status, _) = call(&app, "POST", "/api/start_assessment", Some(start.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "POST", "/api/start_assessment", Some(start)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("active"));
}

#[tokio::test]
async fn message_without_session_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![], &dir);

    let (status, _) = call(
        &app,
        "POST",
        "/api/send_message",
        Some(json!({ "message": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_discards_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![ok("Hello!")], &dir);
    call(&app, "POST", "/api/start_assessment", Some(json!({ "patient_id": "P-2" }))).await;

    let (status, body) = call(&app, "POST", "/api/cancel_assessment", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], json!("not_started"));
    let (_, body) = call(&app, "GET", "/api/get_saved_assessments", None).await;
    assert_eq!(body["assessments"], json!([]));
}

#[tokio::test]
async fn unknown_assessment_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![], &dir);

    let (status, body) = call(
        &app,
        "GET",
        "/api/assessment/patient_P-1_assessment_2025-01-01T00-00-00.000000000Z.json",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("assessment not found"));
}

#[tokio::test]
async fn model_failure_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(
        vec![Err(BedrockError::Invocation("throttled".to_string()))],
        &dir,
    );

    let (status, body) = call(
        &app,
        "POST",
        "/api/start_assessment",
        Some(json!({ "patient_id": "P-3" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("throttled"));
    let (_, body) = call(&app, "GET", "/api/assessment_status", None).await;
    assert_eq!(body["phase"], json!("not_started"));
}

#[tokio::test]
async fn policy_can_be_read_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![], &dir);

    let (status, body) = call(&app, "GET", "/api/get_system_prompt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["system_prompt"], json!(POLICY));

    let (status, _) = call(
        &app,
        "POST",
        "/api/update_system_prompt",
        Some(json!({ "system_prompt": "Be brief." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, "GET", "/api/get_system_prompt", None).await;
    assert_eq!(body["system_prompt"], json!("Be brief."));
    let saved = std::fs::read_to_string(dir.path().join("system_prompt.txt")).unwrap();
    assert_eq!(saved, "Be brief.");

    let (status, _) = call(
        &app,
        "POST",
        "/api/update_system_prompt",
        Some(json!({ "system_prompt": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn session_requests_are_audited_with_the_patient() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = tempfile::tempdir().unwrap();
    let app = app(vec![ok("Hello!")], &dir);
    call(&app, "POST", "/api/start_assessment", Some(json!({ "patient_id": "P-7" }))).await;
    call(&app, "GET", "/health", None).await;

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let audits: Vec<&str> = output.lines().filter(|l| l.contains("api_request")).collect();
    assert_eq!(audits.len(), 2);
    assert!(audits[0].contains(r#""path":"/api/start_assessment""#));
    assert!(audits[0].contains(r#""patient_id":"P-7""#));
    assert!(audits[0].contains(r#""phase":"active""#));
    assert!(audits[1].contains(r#""path":"/health""#));
    assert!(!audits[1].contains("patient_id"));
}
