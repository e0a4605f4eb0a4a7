//! Rewrite Stages
//!
//! Each stage sends every window through the text-generation capability
//! with its own instruction set, guards the result against regressions and
//! repairs bullets that were cut across a window boundary.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::acronym::AcronymTable;
use super::guard::RegressionGuard;
use crate::agent::CallPolicy;
use crate::lexicon::FrameworkTable;
use crate::utils::text::{is_all_caps, lowercase_first, preview, word_count};

const STAGE_TEMPERATURE: f32 = 0.2;

const TONE_PROMPT: &str = "You are a professional editor. Adjust the tone of the text you are given.
Rewrite every sentence rather than deleting it; each idea in the input must survive in meaning, even if it was exaggerated, vague or informal.
Tone: supportive, knowledgeable, efficient, approachable, clear and courteous. Confident, evidence-based and positive.
Avoid sounding technical, over-enthusiastic, over-familiar, patronising or arrogant.
Avoid non-English words (via, per se, ad hoc, per annum) and old English words (thus, therefore, hence).
Keep bullet points and numbered lists exactly as they are. Never break a heading or a bullet point.
Bullet points start with a lowercase letter unless they begin with a proper noun or acronym.
Return only the adjusted text, without explanations.";

const GUIDELINES_PROMPT: &str = "You are an editor who specialises in clarity and readability. Revise the text you are given.
Put the most important information first. Outside headings, use \"we\" instead of \"CCS\".
Use simple words and assume the reader has no prior knowledge. Replace complex phrases with single words.
Avoid jargon, technical language and metaphors. Keep sentences between 15 and 25 words. Use the active voice.
Acronyms are always written in capitals.
Keep bullet points as they are and do not introduce new headings above them. Do not change bullet capitalisation
unless a bullet starts with a proper noun, acronym or name. One sentence per bullet, with no closing punctuation.
Never use an Oxford comma: no comma before the final \"and\" or \"or\" of a list.
Keep existing headings, do not add new ones, and do not repeat content.
Return only the revised text, without explanations.";

const FORMAT_PROMPT: &str = "You are an expert in UK English formatting. Apply these rules strictly without changing the meaning.
Headings are short and capitalise only the first word, unless they contain proper nouns. Never use capitals for emphasis.
Bullet points start with a lowercase letter unless they begin with a proper noun or acronym, carry one idea each
and do not end with a full stop, comma or semicolon. Remove redundant headings right before bullet points.
Dates look like \"Thursday 7 November 2017\" or \"7 November\". Ranges use \"to\" instead of a dash.
Use the pound sign for money. Never shorten thousand, million or billion. Write numbers as numerals except at the
start of a sentence, with commas over 999. Spell out first to ninth, then 10th, 11th. Use the % symbol.
No exclamation marks. No ampersands. Times look like 5:30pm.
Keep paragraph breaks, structure and bullet points. Do not reword unnecessarily.
Return only the formatted text, without explanations.";

lazy_static! {
    static ref BULLET_FIRST_WORD: Regex =
        Regex::new(r"(?m)^([ \t]*[-•●▪◦‣*][ \t]+)(\p{Lu}[\p{L}\p{N}'’-]*)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Tone,
    Guidelines,
    Format,
}

impl StageKind {
    /// Stages in pipeline order.
    pub const ALL: [StageKind; 3] = [StageKind::Tone, StageKind::Guidelines, StageKind::Format];

    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Tone => "tone",
            StageKind::Guidelines => "guidelines",
            StageKind::Format => "format",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            StageKind::Tone => TONE_PROMPT,
            StageKind::Guidelines => GUIDELINES_PROMPT,
            StageKind::Format => FORMAT_PROMPT,
        }
    }
}

/// Names whose capital letter survives the bullet case fix-up.
pub struct KnownTerms<'a> {
    pub acronyms: &'a AcronymTable,
    pub frameworks: &'a FrameworkTable,
}

impl KnownTerms<'_> {
    pub fn keeps_capital(&self, word: &str) -> bool {
        if is_all_caps(word) || word.chars().skip(1).any(char::is_uppercase) {
            return true;
        }
        self.acronyms.is_short_form(word)
            || self.acronyms.starts_full_form(word)
            || self.frameworks.starts_name(word)
    }
}

/// Lowercases the first word of each bullet line unless it is a known name.
pub fn fix_bullet_case(text: &str, known: &KnownTerms<'_>) -> String {
    BULLET_FIRST_WORD
        .replace_all(text, |caps: &regex::Captures| {
            let word = &caps[2];
            if known.keeps_capital(word) {
                caps[0].to_string()
            } else {
                format!("{}{}", &caps[1], lowercase_first(word))
            }
        })
        .into_owned()
}

fn ends_with_open_bullet(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .map(|c| matches!(c, '-' | '•' | '●' | '▪' | '◦' | '‣' | '*'))
        .unwrap_or(false)
}

/// Folds a result into the previous slot when that slot ends on a bullet
/// marker with no text after it.
pub fn fold_bullet_continuations(results: Vec<String>) -> Vec<String> {
    let mut slots: Vec<String> = Vec::with_capacity(results.len());
    for result in results {
        match slots.last_mut() {
            Some(previous) if ends_with_open_bullet(previous) => {
                let joined = format!("{} {}", previous.trim_end(), result.trim_start());
                *previous = joined;
            }
            _ => slots.push(result),
        }
    }
    slots
}

pub struct RewriteStage {
    kind: StageKind,
    policy: CallPolicy,
    guard: RegressionGuard,
    min_words: usize,
}

impl RewriteStage {
    pub fn new(kind: StageKind, policy: CallPolicy, guard: RegressionGuard, min_words: usize) -> Self {
        Self { kind, policy, guard, min_words }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Rewrites one window. Never fails: a service error or an implausibly
    /// short answer yields the window unchanged.
    pub async fn rewrite(&self, index: usize, window: &str, known: &KnownTerms<'_>) -> String {
        let label = format!("{} window {}", self.kind.label(), index + 1);
        let output = match self
            .policy
            .generate(&label, self.kind.system_prompt(), window, STAGE_TEMPERATURE)
            .await
        {
            Ok(output) => output.trim().to_string(),
            Err(e) => {
                warn!("{} falling back to original: {}", label, e);
                return window.to_string();
            }
        };

        let floor = self.min_words.min(word_count(window).div_ceil(2)).max(1);
        if word_count(&output) < floor {
            warn!(
                "{} returned {} words (floor {}), falling back to original",
                label,
                word_count(&output),
                floor
            );
            return window.to_string();
        }
        debug!("{} -> {}", label, preview(&output, 120));

        match self.kind {
            StageKind::Tone => fix_bullet_case(&output, known),
            _ => output,
        }
    }

    /// Runs the stage over every window in order: rewrite, guard, then
    /// bullet continuation repair.
    pub async fn run(&self, windows: &[String], known: &KnownTerms<'_>) -> Vec<String> {
        info!("Stage {}: {} windows", self.kind.label(), windows.len());
        let mut guarded = Vec::with_capacity(windows.len());
        for (index, window) in windows.iter().enumerate() {
            let candidate = self.rewrite(index, window, known).await;
            let label = format!("{} window {}", self.kind.label(), index + 1);
            guarded.push(self.guard.check(&label, window, &candidate).to_string());
        }
        fold_bullet_continuations(guarded)
    }
}
