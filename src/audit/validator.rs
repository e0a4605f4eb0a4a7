//! Rule Validator
//!
//! Deterministic scorecard for a finished document. Each check is a plain
//! text test; no external calls are made.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::document::extract_paragraphs;
use crate::error::PipelineResult;
use crate::lexicon::BannedTerms;
use crate::orchestrator::acronym::AcronymTable;
use crate::utils::text::is_all_caps;

/// Capitalised words that are not emphasis.
const COMMON_INITIALISMS: &[&str] = &["UK", "EU", "VAT", "GDPR", "IT", "HR", "NHS", "PDF", "ID", "FAQ", "CEO", "SME"];

/// Words ending in -ize that are also UK spellings.
const IZE_EXCEPTIONS: &[&str] = &[
    "size", "sizes", "sized", "sizing", "resize", "resized", "downsize", "downsized", "downsizing",
    "oversize", "oversized", "capsize", "prize", "prizes", "seize", "seized", "seizes", "seizing",
];

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

lazy_static! {
    static ref OXFORD_COMMA: Regex = Regex::new(r"(?i),[^,.;:\n]+,\s+(?:and|or)\s").unwrap();
    static ref LATIN: Regex =
        Regex::new(r"(?i)(?:\be\.g\.|\bi\.e\.|\betc\b|\bper se\b|\bvia\b|\bad hoc\b|\bper annum\b)").unwrap();
    static ref CAPS_WORD: Regex = Regex::new(r"\b\p{Lu}{2,}\b").unwrap();
    static ref DEFINED_ACRONYM: Regex = Regex::new(r"\(([\p{Lu}][\p{L}]{1,11})\)").unwrap();
    static ref IZE_WORD: Regex = Regex::new(r"(?i)\b[a-z]+iz(?:e|es|ed|er|ers|ing|ation|ations)\b").unwrap();
    static ref SHORT_MONEY: Regex = Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:m|bn|k)\b").unwrap();
    static ref ORDINAL_DATE: Regex = Regex::new(&format!(
        r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)\s+(?:of\s+)?(?:{m})\b|\b(?:{m})\s+\d{{1,2}}(?:st|nd|rd|th)\b",
        m = MONTHS
    ))
    .unwrap();
    static ref DASH_RANGE: Regex = Regex::new(r"\b\d+(?:[.,]\d+)?\s?[–—-]\s?\d+\b").unwrap();
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleCheck {
    pub rule: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<RuleCheck>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn check(&self, rule: &str) -> Option<&RuleCheck> {
        self.checks.iter().find(|c| c.rule == rule)
    }
}

pub struct RuleValidator {
    banned: BannedTerms,
    acronyms: AcronymTable,
    pattern_checks: Vec<(&'static str, &'static Regex)>,
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleValidator {
    pub fn new() -> Self {
        Self {
            banned: BannedTerms::default(),
            acronyms: AcronymTable::static_table(),
            pattern_checks: vec![
                ("No Oxford comma", &*OXFORD_COMMA),
                ("No Latin abbreviations", &*LATIN),
                ("Spell out million and billion", &*SHORT_MONEY),
                ("No ordinal dates", &*ORDINAL_DATE),
                ("Ranges use \"to\"", &*DASH_RANGE),
            ],
        }
    }

    fn bullet_keeps_capital(&self, word: &str) -> bool {
        is_all_caps(word)
            || word.chars().skip(1).any(char::is_uppercase)
            || self.acronyms.is_short_form(word)
            || self.acronyms.starts_full_form(word)
    }

    pub fn validate_text(&self, text: &str) -> ValidationReport {
        let mut checks = Vec::new();
        let bullets: Vec<&str> = text
            .lines()
            .filter_map(|l| l.trim_start().strip_prefix("- "))
            .map(str::trim)
            .collect();

        let capitalised = bullets.iter().find(|b| {
            let first = b.split_whitespace().next().unwrap_or_default();
            first.chars().next().map(char::is_uppercase).unwrap_or(false) && !self.bullet_keeps_capital(first)
        });
        checks.push(outcome("Bullet points lowercase", capitalised.map(|b| b.to_string())));

        let punctuated = bullets.iter().find(|b| b.ends_with(['.', ',', ';']));
        checks.push(outcome("No punctuation at bullet end", punctuated.map(|b| b.to_string())));

        checks.push(outcome("No exclamation marks", text.contains('!').then(|| "!".to_string())));
        checks.push(outcome("No ampersands", text.contains('&').then(|| "&".to_string())));

        let defined: Vec<&str> = DEFINED_ACRONYM.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
        let shouting = CAPS_WORD.find_iter(text).map(|m| m.as_str()).find(|w| {
            !self.acronyms.is_short_form(w) && !defined.contains(w) && !COMMON_INITIALISMS.contains(w)
        });
        checks.push(outcome("No capitals for emphasis", shouting.map(str::to_string)));

        let banned = self.banned.occurrences(text);
        checks.push(outcome("Banned words absent", (!banned.is_empty()).then(|| banned.join(", "))));

        let us_spelling = IZE_WORD
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|w| !IZE_EXCEPTIONS.contains(&w.to_lowercase().as_str()));
        checks.push(outcome("UK spelling (no -ize)", us_spelling.map(str::to_string)));

        for (rule, pattern) in &self.pattern_checks {
            checks.push(outcome(*rule, pattern.find(text).map(|m| m.as_str().trim().to_string())));
        }

        ValidationReport { checks }
    }

    pub fn validate_file(&self, path: &Path) -> PipelineResult<ValidationReport> {
        let paragraphs = extract_paragraphs(path)?;
        Ok(self.validate_text(&paragraphs.join("\n")))
    }
}

fn outcome(rule: &'static str, evidence: Option<String>) -> RuleCheck {
    RuleCheck { rule, passed: evidence.is_none(), evidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes() {
        let validator = RuleValidator::new();
        let text = "The Crown Commercial Service (CCS) buys cars, vans and bikes.\n- fleet cars for the DfT\n- £5 million over 10 to 12 months";
        let report = validator.validate_text(text);
        let failed: Vec<_> = report.checks.iter().filter(|c| !c.passed).collect();
        assert!(failed.is_empty(), "unexpected failures: {:?}", failed);
        assert!(report.all_passed());
    }

    #[test]
    fn test_each_violation_is_reported() {
        let validator = RuleValidator::new();
        let text = "We buy cars, vans, and bikes!\n- Fleet cars.\nOrders via the portal & phone, e.g. today.\nThis is VERY important.\nWe organize £5m of spend on 3rd March for 10-12 weeks. We utilise it.";
        let report = validator.validate_text(text);
        for rule in [
            "No Oxford comma",
            "Bullet points lowercase",
            "No punctuation at bullet end",
            "No exclamation marks",
            "No ampersands",
            "No capitals for emphasis",
            "No Latin abbreviations",
            "Banned words absent",
            "UK spelling (no -ize)",
            "Spell out million and billion",
            "No ordinal dates",
            "Ranges use \"to\"",
        ] {
            let check = report.check(rule).unwrap();
            assert!(!check.passed, "{} should fail", rule);
        }
        assert_eq!(report.check("No capitals for emphasis").unwrap().evidence.as_deref(), Some("VERY"));
        assert_eq!(report.passed(), 0);
    }

    #[test]
    fn test_size_is_not_us_spelling() {
        let validator = RuleValidator::new();
        let report = validator.validate_text("Choose the right size and organise the prize.");
        assert!(report.check("UK spelling (no -ize)").unwrap().passed);
    }
}
