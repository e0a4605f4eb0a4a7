//! Regression Guard
//!
//! Compares a window before and after a rewrite and decides which version
//! the pipeline carries forward.

use similar::TextDiff;
use tracing::warn;

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Similar enough to the original.
    Candidate,
    /// Dissimilar, but long enough to be a reword rather than a loss.
    LengthCompromise,
    /// Dissimilar and short; content was probably dropped.
    Original,
}

#[derive(Debug, Clone, Copy)]
pub struct RegressionGuard {
    threshold: f32,
    length_ratio: f32,
}

impl Default for RegressionGuard {
    fn default() -> Self {
        Self { threshold: 0.5, length_ratio: 0.8 }
    }
}

impl RegressionGuard {
    pub fn new(threshold: f32, length_ratio: f32) -> Self {
        Self { threshold, length_ratio }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.guard_threshold, config.guard_length_ratio)
    }

    /// Character-sequence similarity in `[0, 1]`.
    pub fn similarity(original: &str, candidate: &str) -> f32 {
        TextDiff::from_chars(original, candidate).ratio()
    }

    /// Decision from lengths (in characters) and a precomputed similarity.
    pub fn decide(&self, original_len: usize, candidate_len: usize, similarity: f32) -> GuardDecision {
        if similarity >= self.threshold {
            GuardDecision::Candidate
        } else if candidate_len as f32 >= self.length_ratio * original_len as f32 {
            GuardDecision::LengthCompromise
        } else {
            GuardDecision::Original
        }
    }

    /// Returns the text to keep.
    pub fn check<'a>(&self, label: &str, original: &'a str, candidate: &'a str) -> &'a str {
        let similarity = Self::similarity(original, candidate);
        let original_len = original.chars().count();
        let candidate_len = candidate.chars().count();

        match self.decide(original_len, candidate_len, similarity) {
            GuardDecision::Candidate => candidate,
            GuardDecision::LengthCompromise => {
                warn!(
                    "{}: similarity {:.2} below {:.2}, keeping rewrite ({} of {} chars)",
                    label, similarity, self.threshold, candidate_len, original_len
                );
                candidate
            }
            GuardDecision::Original => {
                warn!(
                    "{}: similarity {:.2} below {:.2}, rewrite too short ({} of {} chars), keeping original",
                    label, similarity, self.threshold, candidate_len, original_len
                );
                original
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table() {
        let guard = RegressionGuard::default();
        assert_eq!(guard.decide(100, 100, 0.9), GuardDecision::Candidate);
        assert_eq!(guard.decide(100, 40, 0.3), GuardDecision::Original);
        assert_eq!(guard.decide(100, 85, 0.3), GuardDecision::LengthCompromise);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let guard = RegressionGuard::default();
        assert_eq!(guard.decide(100, 10, 0.5), GuardDecision::Candidate);
    }

    #[test]
    fn test_identical_text_is_kept() {
        let guard = RegressionGuard::default();
        assert_eq!(RegressionGuard::similarity("same words", "same words"), 1.0);
        assert_eq!(guard.check("tone", "same words", "same words"), "same words");
    }

    #[test]
    fn test_dropped_content_reverts() {
        let guard = RegressionGuard::default();
        let original = "The supplier must provide monthly reports on every open order and invoice.";
        assert_eq!(guard.check("format", original, "zzz"), original);
    }

    #[test]
    fn test_light_edit_is_accepted() {
        let guard = RegressionGuard::default();
        let original = "We will utilise the portal to buy goods quickly.";
        let candidate = "We will use the portal to buy goods quickly.";
        assert_eq!(guard.check("guidelines", original, candidate), candidate);
    }
}
