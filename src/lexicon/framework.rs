//! Framework Table
//!
//! Maps commercial framework names to their reference numbers. The table
//! is loaded once at start-up and shared read-only; the first-occurrence
//! state lives in a `FrameworkSubstituter` created per document run.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use tracing::{info, warn};

use super::alternation;
use crate::error::{PipelineError, PipelineResult};

const NAME_COLUMN: &str = "framework name";
const NUMBER_COLUMN: &str = "framework number";

#[derive(Default)]
pub struct FrameworkTable {
    codes: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl FrameworkTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let codes: HashMap<String, String> = pairs
            .into_iter()
            .filter_map(|(name, code)| {
                let name = name.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
                let code = code.as_ref().trim();
                (!name.is_empty() && !code.is_empty()).then(|| (name.to_lowercase(), code.to_string()))
            })
            .collect();
        let pattern = alternation(codes.keys().map(String::as_str));
        Self { codes, pattern }
    }

    /// Reads a delimited table with `framework name` and `framework number`
    /// headers. Tab-delimited unless the header line has no tabs, in which
    /// case commas are assumed. An unreadable file yields an empty table.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Framework table {} unreadable ({}), continuing uncoded", path.display(), e);
                return Ok(Self::empty());
            }
        };

        let header_line = content.lines().next().unwrap_or_default();
        let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = match reader.headers() {
            Ok(headers) => headers.iter().map(|h| h.trim().to_lowercase()).collect::<Vec<_>>(),
            Err(e) => {
                warn!("Framework table {} has no readable header ({})", path.display(), e);
                return Ok(Self::empty());
            }
        };

        let position = |name: &str| headers.iter().position(|h| h == name);
        let (name_idx, number_idx) = match (position(NAME_COLUMN), position(NUMBER_COLUMN)) {
            (Some(n), Some(c)) => (n, c),
            (n, c) => {
                let mut missing = Vec::new();
                if n.is_none() {
                    missing.push(NAME_COLUMN.to_string());
                }
                if c.is_none() {
                    missing.push(NUMBER_COLUMN.to_string());
                }
                return Err(PipelineError::MissingColumns { path: path.to_path_buf(), missing });
            }
        };

        let mut pairs = Vec::new();
        for (line, record) in reader.records().enumerate() {
            match record {
                Ok(record) => {
                    if let (Some(name), Some(code)) = (record.get(name_idx), record.get(number_idx)) {
                        pairs.push((name.to_string(), code.to_string()));
                    }
                }
                Err(e) => warn!("Skipping framework row {}: {}", line + 2, e),
            }
        }

        let table = Self::from_pairs(pairs);
        info!("Frameworks loaded: {} entries from {}", table.len(), path.display());
        Ok(table)
    }

    /// `load`, degrading a header problem to an empty table.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("{}; continuing without framework codes", e);
            Self::empty()
        })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code_for(&self, name: &str) -> Option<&str> {
        self.codes.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Whether some framework name begins with `word`.
    pub fn starts_name(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.codes.keys().any(|name| name.split(' ').next() == Some(word.as_str()))
    }

    pub fn substituter(&self) -> FrameworkSubstituter<'_> {
        FrameworkSubstituter { table: self, seen: HashSet::new() }
    }
}

/// First-occurrence state for one document run.
pub struct FrameworkSubstituter<'a> {
    table: &'a FrameworkTable,
    seen: HashSet<String>,
}

impl FrameworkSubstituter<'_> {
    /// First occurrence of a name becomes `name [code]`, later ones `[code]`.
    /// A code already written right after the name is absorbed rather than
    /// repeated.
    pub fn apply(&mut self, text: &str) -> String {
        let Some(pattern) = &self.table.pattern else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len() + 64);
        let mut cursor = 0;
        while let Some(m) = pattern.find_at(text, cursor) {
            let key = m.as_str().to_lowercase();
            let Some(code) = self.table.codes.get(&key) else {
                out.push_str(&text[cursor..m.end()]);
                cursor = m.end();
                continue;
            };

            out.push_str(&text[cursor..m.start()]);
            let tag = format!("[{}]", code);
            if self.seen.insert(key) {
                out.push_str(m.as_str());
                out.push(' ');
            }
            out.push_str(&tag);

            cursor = m.end();
            let rest = &text[cursor..];
            let trimmed = rest.trim_start_matches([' ', '\t']);
            if trimmed.starts_with(&tag) {
                cursor += rest.len() - trimmed.len() + tag.len();
            }
        }
        out.push_str(&text[cursor..]);
        out
    }

    pub fn seen(&self) -> usize {
        self.seen.len()
    }
}
