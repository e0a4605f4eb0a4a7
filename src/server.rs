use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Json, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::audit::RuleValidator;
use crate::document::extract::is_supported;
use crate::error::PipelineError;
use crate::orchestrator::{new_job_id, secure_filename, JobRegistry, JobRunner, Supervisor};
use crate::storage::{audit_key, formatted_key, ArtifactStore, LocalArtifactStore, UPLOAD_PREFIX};

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><title>House Style Formatter</title></head>
<body>
  <h1>House Style Formatter</h1>
  <form id="upload" action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="document" accept=".docx,.txt">
    <button type="submit">Format</button>
  </form>
  <pre id="status"></pre>
  <script>
    const form = document.getElementById('upload');
    const out = document.getElementById('status');
    form.addEventListener('submit', async (e) => {
      e.preventDefault();
      const res = await fetch('/upload', { method: 'POST', body: new FormData(form) });
      const body = await res.json();
      out.textContent = JSON.stringify(body, null, 2);
      if (!body.success) return;
      const poll = setInterval(async () => {
        const s = await (await fetch('/status/' + body.job_id)).json();
        out.textContent = JSON.stringify(s, null, 2);
        if (s.status !== 'processing') clearInterval(poll);
      }, 3000);
    });
  </script>
</body>
</html>"#;

/// Rendered as `{"success": false, "message": ...}`.
#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    message: String,
}

impl ServerError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "success": false, "message": self.message }))).into_response()
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        let status = match err {
            PipelineError::InvalidInput(_) | PipelineError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("malformed upload: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err).into()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub runner: JobRunner,
    pub store: Arc<LocalArtifactStore>,
    pub validator: Arc<RuleValidator>,
    pub upload_dir: PathBuf,
    pub url_ttl: Duration,
}

impl AppState {
    pub fn new(supervisor: Arc<Supervisor>, store: Arc<LocalArtifactStore>, data_dir: &FsPath, url_ttl: Duration) -> Self {
        let runner = JobRunner::new(supervisor, store.clone(), JobRegistry::new(), data_dir, url_ttl);
        Self {
            runner,
            store,
            validator: Arc::new(RuleValidator::new()),
            upload_dir: data_dir.join(UPLOAD_PREFIX),
            url_ttl,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/status/{job_id}", get(status))
        .route("/download/{job_id}/{filename}", get(download))
        .route("/audit_download/{job_id}/{filename}", get(audit_download))
        .route("/validate/{job_id}/{filename}", get(validate))
        .route("/artifacts/{*key}", get(artifact))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("House style service listening on http://{}", addr);
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<impl IntoResponse, ServerError> {
    let mut document = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("document") {
            let name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            document = Some((name, data));
        }
    }

    let (name, data) = document.ok_or_else(|| PipelineError::InvalidInput("no document uploaded".into()))?;
    let safe_name = secure_filename(&name);
    if safe_name.is_empty() {
        return Err(PipelineError::InvalidInput("no file selected".into()).into());
    }
    if data.is_empty() {
        return Err(PipelineError::InvalidInput(format!("{} is empty", safe_name)).into());
    }
    if !is_supported(FsPath::new(&safe_name)) {
        return Err(PipelineError::InvalidInput(format!("{} is not a supported file type", safe_name)).into());
    }

    let job_id = new_job_id();
    tokio::fs::create_dir_all(&state.upload_dir).await?;
    let upload_path = state.upload_dir.join(format!("{}_{}", job_id, safe_name));
    tokio::fs::write(&upload_path, &data).await?;
    info!("Job {} accepted: {} ({} bytes)", job_id, safe_name, data.len());

    let _run = state.runner.submit(job_id.clone(), upload_path).await;
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "success": true, "job_id": job_id }))))
}

async fn status(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<impl IntoResponse, ServerError> {
    let status = state
        .runner
        .registry()
        .get(&job_id)
        .await
        .ok_or_else(|| ServerError::not_found(format!("unknown job {}", job_id)))?;
    Ok(Json(status))
}

async fn signed_link(state: &AppState, key: &str) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.store.exists(key).await {
        return Err(ServerError::not_found("file not found"));
    }
    let url = state.store.signed_url(key, state.url_ttl)?;
    Ok(Json(serde_json::json!({ "success": true, "url": url })))
}

async fn download(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    signed_link(&state, &formatted_key(&job_id, &secure_filename(&filename))).await
}

async fn audit_download(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    signed_link(&state, &audit_key(&job_id, &secure_filename(&filename))).await
}

async fn validate(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ServerError> {
    let key = formatted_key(&job_id, &secure_filename(&filename));
    if !state.store.exists(&key).await {
        return Err(ServerError::not_found("file not found"));
    }
    let path = state.store.path_for(&key)?;
    let report = state.validator.validate_file(&path)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "passed": report.passed(),
        "total": report.checks.len(),
        "checks": report.checks,
    })))
}

#[derive(Debug, Deserialize)]
struct ArtifactQuery {
    expires: i64,
    sig: String,
}

async fn artifact(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ArtifactQuery>,
) -> Result<Response, ServerError> {
    if let Err(e) = state.store.verify(&key, query.expires, &query.sig) {
        warn!("Rejected artifact request for {}: {}", key, e);
        return Err(ServerError::new(StatusCode::FORBIDDEN, e.to_string()));
    }
    if !state.store.exists(&key).await {
        return Err(ServerError::not_found("file not found"));
    }
    let bytes = state.store.load(&key).await?;

    let filename = key.rsplit('/').next().unwrap_or("download");
    let mime = if filename.ends_with(".docx") { DOCX_MIME } else { "application/octet-stream" };
    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        bytes,
    )
        .into_response())
}
