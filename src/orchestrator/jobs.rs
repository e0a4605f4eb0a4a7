//! Jobs
//!
//! One job per upload. The registry is the only state shared between
//! requests; each run owns its working directory and writes its status
//! exactly once when it finishes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::supervisor::{PipelineOutput, Supervisor};
use crate::audit::AuditReport;
use crate::document::{DocumentWriter, DocxWriter};
use crate::error::PipelineResult;
use crate::storage::{audit_key, formatted_key, ArtifactStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done {
        #[serde(rename = "formattedDocumentUrl")]
        formatted_document_url: String,
        #[serde(rename = "auditReportUrl")]
        audit_report_url: String,
    },
    Error {
        message: String,
    },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// First 8 hex characters of a v4 UUID.
pub fn new_job_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Keeps ASCII letters, digits, `.`, `_` and `-`; other characters become
/// `_`. Leading dots are dropped so the name can never be hidden or `..`.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// `<job_id>_brief.txt` (or `brief.txt`) -> `brief.docx`
pub fn output_name(job_id: &str, input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_prefix(&format!("{}_", job_id)).unwrap_or(&stem);
    if stem.is_empty() {
        "document.docx".to_string()
    } else {
        format!("{}.docx", stem)
    }
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, job_id: &str) {
        self.jobs.write().await.insert(job_id.to_string(), JobStatus::Processing);
    }

    pub async fn set(&self, job_id: &str, status: JobStatus) {
        self.jobs.write().await.insert(job_id.to_string(), status);
    }

    pub async fn get(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

/// Local files produced for one document.
#[derive(Debug, Clone)]
pub struct RenderedOutputs {
    /// Source filename with a `.docx` extension.
    pub name: String,
    pub formatted: PathBuf,
    pub audit: Option<PathBuf>,
    pub output: PipelineOutput,
}

/// Runs the pipeline on `input` and writes `<name>.docx` (and, when
/// `with_audit`, `audit_<name>.docx`) into `out_dir`.
pub async fn render_document(
    supervisor: &Supervisor,
    input: &Path,
    out_dir: &Path,
    job_id: &str,
    with_audit: bool,
) -> PipelineResult<RenderedOutputs> {
    let output = supervisor.process_file(input).await?;
    let name = output_name(job_id, input);
    tokio::fs::create_dir_all(out_dir).await?;

    let writer = DocxWriter::default();
    let formatted = out_dir.join(&name);
    writer.write(&output.document, &formatted)?;

    let audit = if with_audit {
        let outcome = supervisor.audit(&output.original_text, &output.final_text).await;
        let report = AuditReport::new(job_id, &name, outcome.sections);
        let path = out_dir.join(format!("audit_{}", name));
        writer.write(&report.to_document(), &path)?;
        Some(path)
    } else {
        None
    };

    Ok(RenderedOutputs { name, formatted, audit, output })
}

#[derive(Clone)]
pub struct JobRunner {
    supervisor: Arc<Supervisor>,
    store: Arc<dyn ArtifactStore>,
    registry: JobRegistry,
    work_dir: PathBuf,
    url_ttl: Duration,
}

impl JobRunner {
    pub fn new(
        supervisor: Arc<Supervisor>,
        store: Arc<dyn ArtifactStore>,
        registry: JobRegistry,
        work_dir: impl Into<PathBuf>,
        url_ttl: Duration,
    ) -> Self {
        Self { supervisor, store, registry, work_dir: work_dir.into(), url_ttl }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Marks the job `processing` and runs it on its own task.
    pub async fn submit(&self, job_id: String, upload: PathBuf) -> tokio::task::JoinHandle<()> {
        self.registry.create(&job_id).await;
        let runner = self.clone();
        tokio::spawn(async move {
            let status = match runner.run(&job_id, &upload).await {
                Ok(status) => status,
                Err(e) => {
                    error!("Job {} failed: {}", job_id, e);
                    JobStatus::Error { message: e.to_string() }
                }
            };
            runner.registry.set(&job_id, status).await;
        })
    }

    #[instrument(skip(self, upload))]
    pub async fn run(&self, job_id: &str, upload: &Path) -> PipelineResult<JobStatus> {
        let out_dir = self.work_dir.join("jobs").join(job_id);
        let rendered = render_document(&self.supervisor, upload, &out_dir, job_id, true).await?;
        let name = &rendered.name;

        let formatted = formatted_key(job_id, name);
        self.store.store(&rendered.formatted, &formatted).await?;
        let audit = audit_key(job_id, name);
        if let Some(path) = &rendered.audit {
            self.store.store(path, &audit).await?;
        }

        info!("Job {} finished ({} windows)", job_id, rendered.output.windows);
        Ok(JobStatus::Done {
            formatted_document_url: self.store.signed_url(&formatted, self.url_ttl)?,
            audit_report_url: self.store.signed_url(&audit, self.url_ttl)?,
        })
    }
}
