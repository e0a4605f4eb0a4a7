use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use house_style::agent::{CallPolicy, LLMProvider};
use house_style::config::PipelineConfig;
use house_style::orchestrator::Supervisor;
use house_style::server::{router, AppState};
use house_style::storage::LocalArtifactStore;

const BASE_URL: &str = "http://localhost:5000";
const BOUNDARY: &str = "X-HOUSE-STYLE-BOUNDARY";

struct EchoProvider;

#[async_trait]
impl LLMProvider for EchoProvider {
    async fn generate(&self, _system: &str, input: &str, _temperature: f32) -> Result<String> {
        Ok(input.to_string())
    }
}

fn app(dir: &std::path::Path) -> Router {
    let policy = CallPolicy::unthrottled(Arc::new(EchoProvider));
    let supervisor = Arc::new(Supervisor::new(policy, PipelineConfig::default()).unwrap());
    let store = Arc::new(LocalArtifactStore::new(dir.join("artifacts"), BASE_URL, "test-secret"));
    router(AppState::new(supervisor, store, dir, Duration::from_secs(600)))
}

fn multipart_upload(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn wait_for_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..100 {
        let response = app.clone().oneshot(get(&format!("/status/{}", job_id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = json_body(response).await;
        if status["status"] != "processing" {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} never finished", job_id);
}

#[tokio::test]
async fn test_index_page() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_process_and_download() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let response = app
        .clone()
        .oneshot(multipart_upload("Brief Notes.txt", "We will utilise the portal.\n- fleet cars\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let accepted = json_body(response).await;
    assert_eq!(accepted["success"], true);
    let job_id = accepted["job_id"].as_str().unwrap().to_string();
    assert_eq!(job_id.len(), 8);

    let status = wait_for_terminal(&app, &job_id).await;
    assert_eq!(status["status"], "done", "{}", status);
    let formatted_url = status["formattedDocumentUrl"].as_str().unwrap();
    assert!(formatted_url.starts_with(&format!("{}/artifacts/formatted_docs/{}/Brief_Notes.docx?", BASE_URL, job_id)));
    assert!(status["auditReportUrl"]
        .as_str()
        .unwrap()
        .contains(&format!("audit_reports/{}/audit_Brief_Notes.docx?", job_id)));

    let response = app.clone().oneshot(get(&formatted_url[BASE_URL.len()..])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.into_body().collect().await.unwrap().to_bytes().is_empty());

    let filename = "Brief_Notes.docx";
    let response = app
        .clone()
        .oneshot(get(&format!("/download/{}/{}", job_id, filename)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["url"].as_str().unwrap().contains("sig="));

    let response = app
        .clone()
        .oneshot(get(&format!("/audit_download/{}/{}", job_id, filename)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/validate/{}/{}", job_id, filename)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["success"], true);
    assert!(report["checks"].as_array().unwrap().len() >= 10);
}

#[tokio::test]
async fn test_unsupported_upload_rejected_without_job() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(multipart_upload("scan.pdf", "%PDF-1.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(!dir.path().join("uploads").exists());
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(multipart_upload("empty.txt", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(get("/status/deadbeef")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_missing_download_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path()).oneshot(get("/download/deadbeef/none.docx")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tampered_signature_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let expires = chrono::Utc::now().timestamp() + 600;
    let uri = format!("/artifacts/formatted_docs/j/a.docx?expires={}&sig=00ff", expires);
    let response = app(dir.path()).oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
