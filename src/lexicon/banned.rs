//! Banned Terms
//!
//! Words the house style forbids (or flags) and their plain replacements.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use super::{alternation, match_case};
use crate::utils::text::capitalize_first;

/// Terms that must not appear in published text.
const NOT_TO_USE: &[(&str, &str)] = &[
    ("assist", "help"),
    ("commence", "start"),
    ("deliver", "provide"),
    ("deploy", "build"),
    ("dialogue", "discussion"),
    ("disincentivise", "discourage"),
    ("documentation", "document"),
    ("e.g.", "for example"),
    ("empower", "allow"),
    ("etc", "including"),
    ("facilitate", "help"),
    ("foster", "encourage"),
    ("garnered", "gathered"),
    ("guidance", "guide"),
    ("i.e.", "that is"),
    ("impact", "affect"),
    ("incentivise", "motivate"),
    ("initiate", "begin"),
    ("key", "important"),
    ("leverage", "use"),
    ("liaise", "work with"),
    ("robust", "well thought out"),
    ("streamline", "simplify"),
    ("tackle", "solve"),
    ("utilise", "use"),
    ("via", "through"),
    ("procurement", "buying"),
    ("procure", "buy"),
    ("aid", "help"),
    ("requirement", "need"),
];

/// Terms to watch; an empty replacement removes the word.
const TO_WATCH: &[(&str, &str)] = &[
    ("advance", "improve"),
    ("agenda", "plan"),
    ("collaborate", "work with"),
    ("combat", "solve"),
    ("just", ""),
    ("savings", "commercial benefits"),
    ("simple", ""),
    ("transformation", "change"),
    ("web page", "webpage"),
];

pub struct BannedTerms {
    replacements: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl BannedTerms {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let replacements: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into().to_lowercase(), v.into()))
            .collect();
        let pattern = alternation(replacements.keys().map(String::as_str));
        Self { replacements, pattern }
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.replacements.contains_key(&term.to_lowercase())
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.replacements.keys().map(String::as_str)
    }

    /// Distinct banned terms present in `text`, lowercased, in order of
    /// first appearance.
    pub fn occurrences(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let mut found: Vec<String> = Vec::new();
        for m in pattern.find_iter(text) {
            let term = m.as_str().to_lowercase();
            if !found.contains(&term) {
                found.push(term);
            }
        }
        found
    }

    /// Replaces every whole-word, case-insensitive occurrence in one pass,
    /// so a replacement is never itself replaced. A removed word takes the
    /// spaces after it along, and passes its capital to the next word.
    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        let mut replaced = 0usize;
        let mut capitalise_next = false;
        for m in pattern.find_iter(text) {
            push_segment(&mut out, &text[cursor..m.start()], &mut capitalise_next);
            cursor = m.end();
            replaced += 1;

            let matched = m.as_str();
            let replacement = self
                .replacements
                .get(&matched.to_lowercase())
                .map(String::as_str)
                .unwrap_or(matched);
            if !replacement.is_empty() {
                push_segment(&mut out, &match_case(matched, replacement), &mut capitalise_next);
                continue;
            }

            let rest = &text[cursor..];
            let after = rest.trim_start_matches([' ', '\t']);
            cursor += rest.len() - after.len();
            let line_start = out.is_empty() || out.ends_with('\n');
            if after.is_empty() || after.starts_with(['\n', '\r', ',', '.', ';', ':', '!', '?']) {
                out.truncate(out.trim_end_matches([' ', '\t']).len());
            }
            capitalise_next = line_start || matched.starts_with(char::is_uppercase);
        }
        push_segment(&mut out, &text[cursor..], &mut capitalise_next);

        debug!("Replaced {} banned term occurrences", replaced);
        out
    }
}

fn push_segment(out: &mut String, segment: &str, capitalise: &mut bool) {
    if segment.is_empty() {
        return;
    }
    if std::mem::take(capitalise) {
        out.push_str(&capitalize_first(segment));
    } else {
        out.push_str(segment);
    }
}

impl Default for BannedTerms {
    fn default() -> Self {
        Self::from_pairs(NOT_TO_USE.iter().chain(TO_WATCH.iter()).copied())
    }
}
