//! Audit Module
//!
//! Scores a processed document against the house style rules: the
//! auditor asks the text-generation capability for a paragraph-level
//! breakdown, the validator runs fixed checks locally.

pub mod auditor;
pub mod report;
pub mod rules;
pub mod validator;

pub use auditor::{chunk_by_paragraph, pair_chunks, AuditOutcome, Auditor};
pub use report::AuditReport;
pub use rules::{numbered_rules, RULES};
pub use validator::{RuleCheck, RuleValidator, ValidationReport};
