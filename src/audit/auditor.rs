//! Auditor
//!
//! Chunks the original and final text along blank lines, pairs the chunks
//! by position and asks the text-generation capability to score each pair
//! against the rule set.

use tracing::{info, warn};

use super::rules::numbered_rules;
use crate::agent::CallPolicy;

const AUDIT_TEMPERATURE: f32 = 0.0;

/// Joins per-chunk audits in the report text.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

const AUDIT_INSTRUCTIONS: &str = "You are an expert document quality auditor for Crown Commercial Service.
You receive an original document (before processing) and the final document (after processing).
Describe only applied changes and missed rules; do not include a rule classification table.
Write a clearly structured report with numbered parts:
1. Rules not covered: what was missed, with examples from the document where the rule was not followed.
2. Before vs after: a table with one row per change, listing the original snippet, the transformed snippet, the rule number(s) and an explanation.
3. Paragraph breakdown: for every paragraph, start with how many rules were covered and how many changes were made,
   then give Input: and Output: and explain line by line how each covered rule changed the input into the output.
Every rule you call covered must appear in the paragraph breakdown with concrete evidence; otherwise treat it as not covered.
Start each part with its title on its own line. Use | only to write table rows.
Do not give general impressions and do not invent rules beyond the list.
Assume the reader knows nothing about the formatting task.

Rules to audit against:
";

/// Splits on blank lines and packs whole paragraphs into chunks of at most
/// `max_chars` characters. A single longer paragraph forms its own chunk.
pub fn chunk_by_paragraph(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let len = current.chars().count() + para.chars().count() + 2;
        if !current.is_empty() && len > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(para);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Pairs chunks by position. The shorter side is padded with empty chunks.
pub fn pair_chunks(original: Vec<String>, processed: Vec<String>) -> Vec<(String, String)> {
    if original.len() != processed.len() {
        warn!(
            "Audit chunk counts differ (original {}, final {}); padding the shorter side",
            original.len(),
            processed.len()
        );
    }
    let n = original.len().max(processed.len());
    let mut original = original.into_iter();
    let mut processed = processed.into_iter();
    (0..n)
        .map(|_| (original.next().unwrap_or_default(), processed.next().unwrap_or_default()))
        .collect()
}

fn chunk_prompt(original: &str, processed: &str) -> String {
    let side = |s: &str| if s.is_empty() { "(no corresponding text)".to_string() } else { s.to_string() };
    format!("Original Document:\n{}\n\nFinal Document:\n{}", side(original), side(processed))
}

#[derive(Debug, Clone, Default)]
pub struct AuditOutcome {
    pub sections: Vec<String>,
    pub omitted: usize,
}

impl AuditOutcome {
    pub fn text(&self) -> String {
        self.sections.join(SECTION_SEPARATOR)
    }
}

pub struct Auditor {
    policy: CallPolicy,
    chunk_chars: usize,
    system_prompt: String,
}

impl Auditor {
    pub fn new(policy: CallPolicy, chunk_chars: usize) -> Self {
        let system_prompt = format!("{}{}", AUDIT_INSTRUCTIONS, numbered_rules());
        Self { policy, chunk_chars, system_prompt }
    }

    /// Audits every chunk pair in order. Failed or empty answers are
    /// dropped from the outcome and counted in `omitted`.
    pub async fn audit(&self, original: &str, processed: &str) -> AuditOutcome {
        let pairs = pair_chunks(
            chunk_by_paragraph(original, self.chunk_chars),
            chunk_by_paragraph(processed, self.chunk_chars),
        );
        let total = pairs.len();
        let mut outcome = AuditOutcome::default();

        for (i, (orig, fin)) in pairs.iter().enumerate() {
            let label = format!("audit chunk {}/{}", i + 1, total);
            match self
                .policy
                .generate(&label, &self.system_prompt, &chunk_prompt(orig, fin), AUDIT_TEMPERATURE)
                .await
            {
                Ok(answer) if !answer.trim().is_empty() => {
                    info!("{} processed", label);
                    outcome.sections.push(answer.trim().to_string());
                }
                Ok(_) => {
                    warn!("{} returned nothing, omitting", label);
                    outcome.omitted += 1;
                }
                Err(e) => {
                    warn!("{} failed, omitting: {}", label, e);
                    outcome.omitted += 1;
                }
            }
        }
        outcome
    }
}
