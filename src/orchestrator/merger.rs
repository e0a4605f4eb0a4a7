//! Merger
//!
//! Deduplicates segments, asks the text-generation capability to merge them
//! into one document, then applies line-level cleanup that is a fixed
//! point: running it on its own output changes nothing.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::agent::CallPolicy;
use crate::utils::text::word_count;

const MERGE_TEMPERATURE: f32 = 0.0;

const MERGE_PROMPT: &str = "You are a document editor. Merge the text segments you are given into one well-structured, coherent document.
Do not lose content and do not duplicate it: each point appears once, even if several segments repeat it.
Do not split bullet points further and do not change their capitalisation.
Use the active voice and UK spelling throughout. Keep proper nouns, acronyms and key terms capitalised.
Keep bullet points and numbered lists as they are, with no extra spaces around them. Never add a heading above bullet points.
No Oxford commas. No semicolons in bullet points. Write numbers as numerals except at the start of a sentence.
Keep tables structured. Keep quotations from named speakers formatted as quotations.
Use bold for major section headings only and do not add markers that were not there.
Outside headings, say \"you\" and \"we\" instead of \"readers\" and \"CCS\".
Never leave segment labels such as \"Window 2:\" in the text.
Return only the merged text, without explanations.";

lazy_static! {
    static ref SEGMENT_LABEL: Regex = Regex::new(r"(?i)\b(?:window|chunk)\s+\d+\s*:[ \t]*").unwrap();
    static ref BULLET_GLYPH: Regex = Regex::new(r"^[ \t]*(?:[●•▪◦‣–]|\*[ \t])[ \t]*").unwrap();
    static ref BULLET_LINE: Regex = Regex::new(r"^[ \t]*-[ \t]+(\S.*)$").unwrap();
    static ref NUMBERED_ITEM: Regex = Regex::new(r"^(\d+[.)])[ \t]+(\p{Ll})").unwrap();
    static ref CURLY_QUOTED: Regex = Regex::new(r"^([ \t]*)“([^”]*)”").unwrap();
}

/// Segments in first-seen order, compared by trimmed text.
pub fn unique_segments<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    segments
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

fn clean_line(line: &str) -> String {
    let mut line = line.to_string();
    while SEGMENT_LABEL.is_match(&line) {
        line = SEGMENT_LABEL.replace_all(&line, "").into_owned();
    }
    let line = line.trim_end();
    let line = BULLET_GLYPH.replace(line, "- ");
    let line = BULLET_LINE.replace(&line, "- $1");
    let line = NUMBERED_ITEM.replace(&line, |caps: &regex::Captures| {
        format!("{} {}", &caps[1], caps[2].to_uppercase())
    });
    CURLY_QUOTED.replace(&line, "$1\"$2\"").trim_end().to_string()
}

fn is_bullet(line: &str) -> bool {
    line.starts_with("- ")
}

/// Line-level fix-ups applied after every merge.
pub fn cleanup(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = clean_line(raw);
        if line.trim().is_empty() {
            match out.last() {
                None => continue,
                Some(prev) if prev.is_empty() || is_bullet(prev) => continue,
                _ => out.push(String::new()),
            }
        } else {
            out.push(line);
        }
    }
    while out.last().map(|l| l.is_empty()).unwrap_or(false) {
        out.pop();
    }
    out.join("\n")
}

pub struct Merger {
    policy: CallPolicy,
}

impl Merger {
    pub fn new(policy: CallPolicy) -> Self {
        Self { policy }
    }

    /// Merges `segments` into one text. Falls back to joining the unique
    /// segments when the call fails or the answer lost most of the words.
    pub async fn merge<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let unique = unique_segments(segments);
        if unique.len() < segments.len() {
            info!("Merger dropped {} duplicate segments", segments.len() - unique.len());
        }
        let joined = unique.join("\n\n");
        if joined.is_empty() {
            return joined;
        }

        let merged = match self.policy.generate("merge", MERGE_PROMPT, &joined, MERGE_TEMPERATURE).await {
            Ok(answer) if word_count(&answer) >= word_count(&joined).div_ceil(2) => answer,
            Ok(answer) => {
                warn!(
                    "Merge answer has {} of {} words, joining segments instead",
                    word_count(&answer),
                    word_count(&joined)
                );
                joined
            }
            Err(e) => {
                warn!("Merge failed, joining segments instead: {}", e);
                joined
            }
        };
        cleanup(&merged)
    }
}
