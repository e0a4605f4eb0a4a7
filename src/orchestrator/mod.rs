//! Orchestrator Module
//!
//! The rewrite pipeline for one document and the jobs that run it.

pub mod acronym;
pub mod guard;
pub mod jobs;
pub mod merger;
pub mod stage;
pub mod supervisor;
pub mod window;

pub use acronym::{AcronymExpander, AcronymPass, AcronymTable};
pub use guard::{GuardDecision, RegressionGuard};
pub use jobs::{new_job_id, render_document, secure_filename, JobRegistry, JobRunner, JobStatus};
pub use merger::Merger;
pub use stage::{KnownTerms, RewriteStage, StageKind};
pub use supervisor::{PipelineOutput, Supervisor};
pub use window::{Window, Windower};
