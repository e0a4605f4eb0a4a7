//! Acronym Expander
//!
//! The first mention of a tracked term is written as `Full Form (SHORT)`;
//! every later mention of either form collapses to `SHORT`. The table is
//! the static glossary plus whatever the text-generation capability finds
//! in the document, and both the table and the seen-set are built fresh
//! for every document run.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::agent::CallPolicy;
use crate::lexicon::alternation;
use crate::utils::text::word_count;

const ACRONYM_TEMPERATURE: f32 = 0.2;

const STATIC_ACRONYMS: &[(&str, &str)] = &[
    ("Attorney General’s Office", "AGO"),
    ("Cabinet Office", "CO"),
    ("Department for Business and Trade", "DBT"),
    ("Department for Culture, Media and Sport", "DCMS"),
    ("Department for Education", "DfE"),
    ("Department for Energy Security and Net Zero", "DESNZ"),
    ("Department for Environment, Food and Rural Affairs", "Defra"),
    ("Department for Science, Innovation and Technology", "DSIT"),
    ("Department for Transport", "DfT"),
    ("Department for Work and Pensions", "DWP"),
    ("Department of Health and Social Care", "DHSC"),
    ("Foreign, Commonwealth and Development Office", "FCDO"),
    ("HM Treasury", "HMT"),
    ("Home Office", "HO"),
    ("Ministry of Defence", "MOD"),
    ("Ministry of Justice", "MOJ"),
    ("Invitation to Tender", "ITT"),
    ("Dynamic Purchasing System", "DPS"),
    ("Crown Commercial Service", "CCS"),
];

const ORDINARY_WORDS: &[&str] = &["ago", "co", "ho", "mod", "it", "us", "do"];

const DISCOVERY_PROMPT: &str = "You are a writing assistant for the Crown Commercial Service.
List the acronyms that appear in the text and are relevant to the Crown Commercial Service or public sector buying.
Write each one as 'Full Form (ACRONYM)', one per line. Output only valid pairs, with no explanations.";

const CAPITALISATION_PROMPT: &str = "You are a writing assistant for the Crown Commercial Service.
Correct the capitalisation of acronyms in the text (for example CCS, SMEs, DPS) and change nothing else.
Do not rephrase, and do not change punctuation, grammar, structure or formatting.
Return the text without explanations or notes.";

lazy_static! {
    static ref DISCOVERED_PAIR: Regex = Regex::new(r"^(.+?)\s+\(([^)]+)\)").unwrap();
    static ref LIST_PREFIX: Regex = Regex::new(r"^(?:[-•*]|\d+[.)])\s*").unwrap();
}

#[derive(Debug, Clone)]
struct Entry {
    full: String,
    short: String,
}

/// Full form to short form, case-insensitive both ways.
#[derive(Debug, Clone, Default)]
pub struct AcronymTable {
    entries: Vec<Entry>,
    by_full: HashMap<String, usize>,
    by_short: HashMap<String, usize>,
    pattern: Option<Regex>,
}

impl AcronymTable {
    pub fn static_table() -> Self {
        Self::default().extended(STATIC_ACRONYMS.iter().map(|(f, s)| (f.to_string(), s.to_string())))
    }

    /// Adds pairs that collide with no existing full or short form; entries
    /// already present win.
    pub fn extended<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (full, short) in pairs {
            let full = full.split_whitespace().collect::<Vec<_>>().join(" ");
            let short = short.trim().to_string();
            if full.is_empty() || short.is_empty() || full.eq_ignore_ascii_case(&short) {
                continue;
            }
            let (full_key, short_key) = (full.to_lowercase(), short.to_lowercase());
            if self.by_full.contains_key(&full_key) || self.by_short.contains_key(&short_key) {
                debug!("Ignoring acronym {} ({}): already tracked", full, short);
                continue;
            }
            self.by_full.insert(full_key, self.entries.len());
            self.by_short.insert(short_key, self.entries.len());
            self.entries.push(Entry { full, short });
        }

        let forms = self.entries.iter().flat_map(|e| [e.full.as_str(), e.short.as_str()]);
        self.pattern = alternation(forms);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn short_for(&self, full: &str) -> Option<&str> {
        self.by_full.get(&full.to_lowercase()).map(|&i| self.entries[i].short.as_str())
    }

    pub fn full_for(&self, short: &str) -> Option<&str> {
        self.by_short.get(&short.to_lowercase()).map(|&i| self.entries[i].full.as_str())
    }

    /// Exact-case match against a short form, e.g. `DfT` but not `dft`.
    pub fn is_short_form(&self, word: &str) -> bool {
        self.by_short
            .get(&word.to_lowercase())
            .map(|&i| self.entries[i].short == word)
            .unwrap_or(false)
    }

    pub fn starts_full_form(&self, word: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.full.split(' ').next().map(|w| w == word).unwrap_or(false))
    }

    pub fn short_forms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.short.as_str())
    }

    pub fn expander(&self) -> AcronymExpander<'_> {
        AcronymExpander { table: self, seen: HashSet::new() }
    }
}

/// Parses `Full Form (ACRONYM)` lines, ignoring anything else.
pub fn parse_discovered(answer: &str) -> Vec<(String, String)> {
    answer
        .lines()
        .filter_map(|line| {
            let line = LIST_PREFIX.replace(line.trim(), "");
            let caps = DISCOVERED_PAIR.captures(&line)?;
            let full = caps[1].trim().trim_matches(['"', '\'', '*']).trim().to_string();
            let short = caps[2].trim().to_string();
            let plausible = !short.is_empty()
                && short.len() <= 12
                && !short.contains(char::is_whitespace)
                && word_count(&full) >= 2;
            plausible.then_some((full, short))
        })
        .collect()
}

/// First-occurrence state for one document run.
pub struct AcronymExpander<'a> {
    table: &'a AcronymTable,
    seen: HashSet<String>,
}

impl AcronymExpander<'_> {
    pub fn apply(&mut self, text: &str) -> String {
        let Some(pattern) = &self.table.pattern else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len() + 64);
        let mut cursor = 0;
        while let Some(m) = pattern.find_at(text, cursor) {
            let key = m.as_str().to_lowercase();
            let (entry, is_full) = match (self.table.by_full.get(&key), self.table.by_short.get(&key)) {
                (Some(&i), _) => (&self.table.entries[i], true),
                (None, Some(&i)) => (&self.table.entries[i], false),
                (None, None) => {
                    out.push_str(&text[cursor..m.end()]);
                    cursor = m.end();
                    continue;
                }
            };

            // Short forms glued to a hyphen are word parts (co-operate).
            let hyphenated = text[..m.start()].ends_with('-') || text[m.end()..].starts_with('-');
            if !is_full && (hyphenated || is_ordinary_word(m.as_str(), &entry.short)) {
                out.push_str(&text[cursor..m.end()]);
                cursor = m.end();
                continue;
            }

            out.push_str(&text[cursor..m.start()]);
            let first = self.seen.insert(entry.full.to_lowercase());
            match (first, is_full) {
                (true, true) => {
                    out.push_str(m.as_str());
                    out.push_str(&format!(" ({})", entry.short));
                }
                (true, false) => out.push_str(&format!("{} ({})", entry.full, entry.short)),
                (false, _) => out.push_str(&entry.short),
            }
            cursor = m.end();

            if is_full {
                cursor += parenthesised_short(&text[cursor..], &entry.short);
            }
        }
        out.push_str(&text[cursor..]);
        out
    }

    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}

/// Short forms that are also everyday words ("two years ago", "It is")
/// only count when written exactly as the short form or in capitals.
fn is_ordinary_word(matched: &str, short: &str) -> bool {
    ORDINARY_WORDS.contains(&matched.to_lowercase().as_str())
        && matched != short
        && matched.chars().any(char::is_lowercase)
}

/// Length of a leading ` (SHORT)` in `rest`, or 0.
fn parenthesised_short(rest: &str, short: &str) -> usize {
    let trimmed = rest.trim_start_matches([' ', '\t']);
    let Some(inner) = trimmed.strip_prefix('(') else {
        return 0;
    };
    let Some(close) = inner.find(')') else {
        return 0;
    };
    if inner[..close].trim().eq_ignore_ascii_case(short) {
        rest.len() - trimmed.len() + 1 + close + 1
    } else {
        0
    }
}

/// Whole-document acronym pass: discovery, expansion and a capitalisation
/// correction, each external step with its own fallback.
pub struct AcronymPass {
    policy: CallPolicy,
    base: AcronymTable,
}

impl AcronymPass {
    pub fn new(policy: CallPolicy) -> Self {
        Self { policy, base: AcronymTable::static_table() }
    }

    pub fn with_base(mut self, base: AcronymTable) -> Self {
        self.base = base;
        self
    }

    pub fn base(&self) -> &AcronymTable {
        &self.base
    }

    /// Discovered pairs, or none if the call fails.
    pub async fn discover(&self, text: &str) -> Vec<(String, String)> {
        match self
            .policy
            .generate("acronym discovery", DISCOVERY_PROMPT, text, ACRONYM_TEMPERATURE)
            .await
        {
            Ok(answer) => {
                let pairs = parse_discovered(&answer);
                info!("Discovered {} acronyms", pairs.len());
                pairs
            }
            Err(e) => {
                warn!("Acronym discovery failed, using static glossary only: {}", e);
                Vec::new()
            }
        }
    }

    /// Capitalisation correction; keeps `text` when the call fails or the
    /// answer looks like a rewrite rather than a correction.
    pub async fn correct_capitalisation(&self, text: &str) -> String {
        match self
            .policy
            .generate("acronym capitalisation", CAPITALISATION_PROMPT, text, ACRONYM_TEMPERATURE)
            .await
        {
            Ok(answer) => {
                let answer = answer.trim();
                if word_count(answer) != word_count(text) {
                    warn!(
                        "Acronym capitalisation changed the word count ({} -> {}), keeping uncorrected text",
                        word_count(text),
                        word_count(answer)
                    );
                    text.to_string()
                } else {
                    answer.to_string()
                }
            }
            Err(e) => {
                warn!("Acronym capitalisation failed, keeping uncorrected text: {}", e);
                text.to_string()
            }
        }
    }

    pub async fn run(&self, text: &str) -> String {
        let discovered = self.discover(text).await;
        let table = self.base.clone().extended(discovered);
        let mut expander = table.expander();
        let expanded = expander.apply(text);
        info!("Expanded {} acronyms ({} tracked)", expander.seen(), table.len());
        self.correct_capitalisation(&expanded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::agent::test_support::{EchoProvider, FailingProvider, FixedProvider};

    #[test]
    fn test_first_full_form_expands_then_collapses() {
        let table = AcronymTable::static_table();
        let mut expander = table.expander();
        let out = expander.apply(
            "Crown Commercial Service helps. Crown Commercial Service buys. CCS sells.",
        );
        assert_eq!(out, "Crown Commercial Service (CCS) helps. CCS buys. CCS sells.");
    }

    #[test]
    fn test_short_form_first_gets_full_form() {
        let table = AcronymTable::static_table();
        let mut expander = table.expander();
        assert_eq!(
            expander.apply("Ask the dps team. The Dynamic Purchasing System is open."),
            "Ask the Dynamic Purchasing System (DPS) team. The DPS is open."
        );
    }

    #[test]
    fn test_existing_parenthesis_not_doubled() {
        let table = AcronymTable::static_table();
        let mut expander = table.expander();
        assert_eq!(
            expander.apply("Crown Commercial Service (CCS) and later Crown Commercial Service (CCS)."),
            "Crown Commercial Service (CCS) and later CCS."
        );
    }

    #[test]
    fn test_hyphenated_short_forms_ignored() {
        let table = AcronymTable::static_table();
        let mut expander = table.expander();
        assert_eq!(expander.apply("We co-operate."), "We co-operate.");
        assert_eq!(expander.seen(), 0);
    }

    #[test]
    fn test_lowercase_everyday_words_are_not_short_forms() {
        let table = AcronymTable::static_table();
        let mut expander = table.expander();
        assert_eq!(expander.apply("We met two years ago."), "We met two years ago.");
        assert_eq!(
            expander.apply("The AGO replied."),
            "The Attorney General’s Office (AGO) replied."
        );
    }

    #[test]
    fn test_sentence_case_everyday_words_are_not_short_forms() {
        let table = AcronymTable::static_table()
            .extended([("Information Technology".to_string(), "IT".to_string())]);
        let mut expander = table.expander();
        assert_eq!(
            expander.apply("It is ready. We buy IT kit. Mod packs and Co-op shops."),
            "It is ready. We buy Information Technology (IT) kit. Mod packs and Co-op shops."
        );
        assert_eq!(expander.apply("Ask the MOD."), "Ask the Ministry of Defence (MOD).");
    }

    #[test]
    fn test_static_entries_take_precedence() {
        let table = AcronymTable::static_table().extended(vec![
            ("Crown Commercial Service".to_string(), "CrCS".to_string()),
            ("Small and medium enterprises".to_string(), "SMEs".to_string()),
        ]);
        assert_eq!(table.short_for("crown commercial service"), Some("CCS"));
        assert_eq!(table.full_for("smes"), Some("Small and medium enterprises"));
        assert_eq!(table.len(), STATIC_ACRONYMS.len() + 1);
    }

    #[test]
    fn test_expanders_do_not_share_state() {
        let table = AcronymTable::static_table();
        let mut first = table.expander();
        first.apply("Home Office");
        let mut second = table.expander();
        assert_eq!(second.apply("Home Office"), "Home Office (HO)");
    }

    #[test]
    fn test_parse_discovered() {
        let answer = "- Small and Medium Enterprises (SMEs)\n1. Public Contracts Regulations (PCR)\nNothing here\nX (Y)";
        assert_eq!(
            parse_discovered(answer),
            vec![
                ("Small and Medium Enterprises".to_string(), "SMEs".to_string()),
                ("Public Contracts Regulations".to_string(), "PCR".to_string()),
            ]
        );
    }

    #[test]
    fn test_known_term_helpers() {
        let table = AcronymTable::static_table();
        assert!(table.is_short_form("DfT"));
        assert!(!table.is_short_form("dft"));
        assert!(table.starts_full_form("Crown"));
        assert!(!table.starts_full_form("Fleet"));
    }

    #[tokio::test]
    async fn test_run_with_unreachable_service_uses_static_table() {
        let pass = AcronymPass::new(CallPolicy::unthrottled(Arc::new(FailingProvider)));
        let out = pass.run("The Cabinet Office and the Cabinet Office.").await;
        assert_eq!(out, "The Cabinet Office (CO) and the CO.");
    }

    #[tokio::test]
    async fn test_capitalisation_rewrite_is_rejected() {
        let policy = CallPolicy::unthrottled(Arc::new(FixedProvider("completely different".into())));
        let pass = AcronymPass::new(policy);
        let text = "Ask the ccs team about this";
        assert_eq!(pass.correct_capitalisation(text).await, text);
    }

    #[tokio::test]
    async fn test_discovery_parses_answer() {
        let policy = CallPolicy::unthrottled(Arc::new(EchoProvider));
        let pass = AcronymPass::new(policy);
        let pairs = pass.discover("Public Sector Buyers (PSB)").await;
        assert_eq!(pairs, vec![("Public Sector Buyers".to_string(), "PSB".to_string())]);
    }
}
