//! Supervisor
//!
//! Drives one document through the whole pipeline: lexical substitution,
//! windowing, the rewrite stages, stitching, acronym expansion, merging
//! and assembly. Every run builds its own first-occurrence state, so one
//! supervisor can serve many documents concurrently.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use super::acronym::{AcronymPass, AcronymTable};
use super::guard::RegressionGuard;
use super::merger::Merger;
use super::stage::{KnownTerms, RewriteStage, StageKind};
use super::window::Windower;
use crate::agent::CallPolicy;
use crate::audit::{AuditOutcome, Auditor};
use crate::config::PipelineConfig;
use crate::document::{assemble, extract_paragraphs, StructuredDocument};
use crate::error::PipelineResult;
use crate::lexicon::{BannedTerms, FrameworkTable};

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Extracted paragraphs separated by blank lines.
    pub original_text: String,
    /// Text after framework and banned-term substitution.
    pub substituted_text: String,
    /// Merged text the document was assembled from.
    pub final_text: String,
    pub document: StructuredDocument,
    pub windows: usize,
}

pub struct Supervisor {
    policy: CallPolicy,
    config: PipelineConfig,
    windower: Windower,
    guard: RegressionGuard,
    banned: Arc<BannedTerms>,
    frameworks: Arc<FrameworkTable>,
    acronyms: AcronymTable,
}

impl Supervisor {
    pub fn new(policy: CallPolicy, config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let windower = Windower::new(config.window_words, config.window_overlap)?;
        Ok(Self {
            policy,
            guard: RegressionGuard::from_config(&config),
            config,
            windower,
            banned: Arc::new(BannedTerms::default()),
            frameworks: Arc::new(FrameworkTable::empty()),
            acronyms: AcronymTable::static_table(),
        })
    }

    pub fn with_frameworks(mut self, frameworks: Arc<FrameworkTable>) -> Self {
        self.frameworks = frameworks;
        self
    }

    pub fn with_banned_terms(mut self, banned: Arc<BannedTerms>) -> Self {
        self.banned = banned;
        self
    }

    pub fn with_acronyms(mut self, acronyms: AcronymTable) -> Self {
        self.acronyms = acronyms;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Framework codes first, then banned terms, over the whole text.
    pub fn substitute(&self, paragraphs: &[String]) -> Vec<String> {
        let full_text = paragraphs.join("\n");
        let mut frameworks = self.frameworks.substituter();
        let coded = frameworks.apply(&full_text);
        info!("Framework names coded: {}", frameworks.seen());

        self.banned
            .apply(&coded)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub async fn process_paragraphs(&self, paragraphs: &[String]) -> PipelineOutput {
        let original_text = paragraphs.join("\n\n");
        let substituted = self.substitute(paragraphs);

        let windows = self.windower.split(&substituted);
        let window_count = windows.len();
        let mut current: Vec<String> = windows.into_iter().map(|w| w.text).collect();

        let known = KnownTerms { acronyms: &self.acronyms, frameworks: &self.frameworks };
        for kind in StageKind::ALL {
            let stage = RewriteStage::new(kind, self.policy.clone(), self.guard, self.config.min_rewrite_words);
            current = stage.run(&current, &known).await;
        }

        let stitched = self.windower.stitch(&current);
        let expanded = AcronymPass::new(self.policy.clone())
            .with_base(self.acronyms.clone())
            .run(&stitched)
            .await;

        let segments: Vec<&str> = expanded.split("\n\n").filter(|s| !s.trim().is_empty()).collect();
        let final_text = Merger::new(self.policy.clone()).merge(&segments).await;
        let document = assemble(&final_text);
        info!(
            "Pipeline finished: {} windows, {} blocks, {} chars",
            window_count,
            document.blocks.len(),
            final_text.len()
        );

        PipelineOutput {
            original_text,
            substituted_text: substituted.join("\n"),
            final_text,
            document,
            windows: window_count,
        }
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn process_file(&self, path: &Path) -> PipelineResult<PipelineOutput> {
        let paragraphs = extract_paragraphs(path)?;
        info!("Extracted {} paragraphs", paragraphs.len());
        Ok(self.process_paragraphs(&paragraphs).await)
    }

    pub async fn audit(&self, original: &str, processed: &str) -> AuditOutcome {
        Auditor::new(self.policy.clone(), self.config.audit_chunk_chars)
            .audit(original, processed)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::{EchoProvider, FailingProvider};

    fn config() -> PipelineConfig {
        PipelineConfig { window_words: 12, window_overlap: 3, ..PipelineConfig::default() }
    }

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_invalid_window_config_rejected() {
        let policy = CallPolicy::unthrottled(Arc::new(EchoProvider));
        let bad = PipelineConfig { window_words: 5, window_overlap: 5, ..PipelineConfig::default() };
        assert!(Supervisor::new(policy, bad).is_err());
    }

    #[test]
    fn test_substitute_frameworks_then_banned() {
        let policy = CallPolicy::unthrottled(Arc::new(EchoProvider));
        let supervisor = Supervisor::new(policy, config())
            .unwrap()
            .with_frameworks(Arc::new(FrameworkTable::from_pairs([("Vehicle Lease", "RM6060")])));
        let out = supervisor.substitute(&[
            "We procure through Vehicle Lease.".to_string(),
            "Vehicle Lease helps.".to_string(),
        ]);
        assert_eq!(out, vec!["We buy through Vehicle Lease [RM6060].", "[RM6060] helps."]);
    }

    #[tokio::test]
    async fn test_unreachable_service_keeps_substituted_text() {
        let policy = CallPolicy::unthrottled(Arc::new(FailingProvider));
        let supervisor = Supervisor::new(policy, config()).unwrap();
        let paragraphs = vec![
            "We will utilise the Crown Commercial Service portal for every order we place this year.".to_string(),
            "The Crown Commercial Service team answers questions about each order quickly.".to_string(),
        ];
        let output = supervisor.process_paragraphs(&paragraphs).await;

        assert!(output.windows > 1);
        let expected = "We will use the Crown Commercial Service (CCS) portal for every order we place this year. \
                        The CCS team answers questions about each order quickly.";
        assert_eq!(words(&output.final_text), words(expected));
        assert!(!output.document.is_empty());
    }

    #[tokio::test]
    async fn test_audit_with_unreachable_service_is_empty() {
        let policy = CallPolicy::unthrottled(Arc::new(FailingProvider));
        let supervisor = Supervisor::new(policy, config()).unwrap();
        let outcome = supervisor.audit("a", "b").await;
        assert!(outcome.sections.is_empty());
    }
}
