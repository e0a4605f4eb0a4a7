//! Lexicon
//!
//! Deterministic whole-word substitutions applied to the full document
//! text before it is windowed: banned terms and framework names.

pub mod banned;
pub mod framework;

pub use banned::BannedTerms;
pub use framework::{FrameworkSubstituter, FrameworkTable};

use regex::{Regex, RegexBuilder};

use crate::utils::text::{capitalize_first, is_all_caps};

/// Builds one case-insensitive alternation over `terms`, longest first, so
/// a multi-word phrase wins over any shorter term it contains. Word
/// boundaries are only asserted at ends that are word characters, which
/// keeps keys like `e.g.` matchable.
pub(crate) fn alternation<'a, I>(terms: I) -> Option<Regex>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut terms: Vec<&str> = terms.into_iter().filter(|t| !t.trim().is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();

    let body = terms.iter().map(|t| bounded(t)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&format!("(?:{})", body))
        .case_insensitive(true)
        .build()
        .ok()
}

fn bounded(term: &str) -> String {
    let is_word = |c: Option<char>| c.map(|c| c.is_alphanumeric() || c == '_').unwrap_or(false);
    let start = if is_word(term.chars().next()) { r"\b" } else { "" };
    let end = if is_word(term.chars().last()) { r"\b" } else { "" };
    format!("{}{}{}", start, regex::escape(term), end)
}

/// Gives `replacement` the capitalisation of `matched`.
pub(crate) fn match_case(matched: &str, replacement: &str) -> String {
    if replacement.is_empty() {
        return String::new();
    }
    if is_all_caps(matched) {
        return replacement.to_uppercase();
    }
    if matched.chars().next().map(char::is_uppercase).unwrap_or(false) {
        return capitalize_first(replacement);
    }
    replacement.to_string()
}
