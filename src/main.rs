//! House Style Formatter
//!
//! `serve` runs the upload service, `process` formats one document
//! locally, `validate` prints the rule scorecard for a finished document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use house_style::agent::{provider_from_config, CallPolicy};
use house_style::audit::RuleValidator;
use house_style::lexicon::FrameworkTable;
use house_style::orchestrator::{new_job_id, render_document, Supervisor};
use house_style::server::{run_server, AppState};
use house_style::storage::LocalArtifactStore;
use house_style::utils::init_logging;
use house_style::AppConfig;

#[derive(Parser)]
#[command(name = "house-style", version, about = "Rewrites documents into the house writing style")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP upload service
    Serve,
    /// Format one document and write the results locally
    Process {
        input: PathBuf,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Skip the audit report
        #[arg(long)]
        no_audit: bool,
    },
    /// Print the rule scorecard for a formatted document
    Validate { document: PathBuf },
}

fn build_supervisor(config: &AppConfig) -> Result<Supervisor> {
    let provider = provider_from_config(&config.provider);
    info!("Using text generation backend: {}", provider.name());
    let policy = CallPolicy::new(provider, &config.calls);
    let frameworks = FrameworkTable::load_or_empty(&config.framework_table);
    info!("Loaded {} framework names", frameworks.len());

    let supervisor = Supervisor::new(policy, config.pipeline.clone())
        .context("invalid pipeline configuration")?
        .with_frameworks(Arc::new(frameworks));
    Ok(supervisor)
}

async fn serve(config: AppConfig) -> Result<()> {
    let supervisor = Arc::new(build_supervisor(&config)?);
    let store = Arc::new(LocalArtifactStore::new(
        config.data_dir.join("artifacts"),
        &config.public_base_url,
        config.signing_secret.as_bytes(),
    ));
    let state = AppState::new(supervisor, store, &config.data_dir, config.signed_url_ttl);
    run_server(state, &config.bind_addr).await
}

async fn process(config: AppConfig, input: &Path, output_dir: &Path, no_audit: bool) -> Result<()> {
    let supervisor = build_supervisor(&config)?;
    let job_id = new_job_id();
    let rendered = render_document(&supervisor, input, output_dir, &job_id, !no_audit)
        .await
        .with_context(|| format!("processing {}", input.display()))?;

    println!("{}", rendered.formatted.display());
    if let Some(audit) = rendered.audit {
        println!("{}", audit.display());
    }
    Ok(())
}

fn validate(document: &Path) -> Result<()> {
    let report = RuleValidator::new()
        .validate_file(document)
        .with_context(|| format!("reading {}", document.display()))?;

    for check in &report.checks {
        let mark = if check.passed { "PASS" } else { "FAIL" };
        match &check.evidence {
            Some(evidence) => println!("[{}] {} ({})", mark, check.rule, evidence),
            None => println!("[{}] {}", mark, check.rule),
        }
    }
    println!("{}/{} rules passed", report.passed(), report.checks.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Command::Validate { document } = &cli.command {
        let _guard = init_logging(None);
        return validate(document);
    }

    let config = AppConfig::from_env().context("loading configuration")?;
    let _guard = init_logging(config.log_dir.as_deref());

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Process { input, output_dir, no_audit } => process(config, &input, &output_dir, no_audit).await,
        Command::Validate { .. } => Ok(()),
    }
}
