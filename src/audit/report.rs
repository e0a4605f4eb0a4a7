//! Audit Report
//!
//! Lays the auditor's sections out as a document: a cover page, then one
//! heading per section with its body. Pipe-delimited lines become table
//! rows.

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;

use super::auditor::SECTION_SEPARATOR;
use crate::document::{LineKind, StructuredDocument};

pub const REPORT_TITLE: &str = "Document Formatting Audit Report";
pub const HEADING_COLOR: &str = "003296";
const GENERATOR: &str = "House Style Formatter";

lazy_static! {
    static ref SEPARATOR_CELL: Regex = Regex::new(r"^:?-{2,}:?$").unwrap();
}

pub struct AuditReport {
    pub job_id: String,
    pub filename: String,
    pub generated: DateTime<Local>,
    pub sections: Vec<String>,
}

impl AuditReport {
    pub fn new(job_id: impl Into<String>, filename: impl Into<String>, sections: Vec<String>) -> Self {
        Self {
            job_id: job_id.into(),
            filename: filename.into(),
            generated: Local::now(),
            sections,
        }
    }

    pub fn text(&self) -> String {
        self.sections.join(SECTION_SEPARATOR)
    }

    pub fn to_document(&self) -> StructuredDocument {
        let mut doc = StructuredDocument::new().with_heading_color(HEADING_COLOR);
        doc.add_title(REPORT_TITLE);
        doc.add_caption(format!("Job ID: {}", self.job_id));
        doc.add_caption(format!("Filename: {}", self.filename));
        doc.add_caption(format!("Date: {}", self.generated.format("%d %B %Y")));
        doc.add_caption(format!("Generated by: {}", GENERATOR));
        doc.add_page_break();

        if self.sections.is_empty() {
            doc.add_paragraph("No audit findings were produced for this document.");
            return doc;
        }
        for section in &self.sections {
            write_section(&mut doc, section);
        }
        doc
    }
}

/// Cells of a pipe-delimited row, or `None` for anything else.
fn table_cells(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if !line.starts_with('|') {
        return None;
    }
    let cells: Vec<String> = line
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    (cells.len() >= 2).then_some(cells)
}

fn is_separator_row(cells: &[String]) -> bool {
    cells.iter().all(|c| SEPARATOR_CELL.is_match(c))
}

fn heading_text(line: &str) -> &str {
    line.trim().trim_start_matches('#').trim().trim_matches('*').trim()
}

fn write_section(doc: &mut StructuredDocument, section: &str) {
    let mut lines = section.lines().skip_while(|l| l.trim().is_empty() || l.trim() == "---");
    if let Some(title) = lines.next() {
        let title = heading_text(title);
        if !title.is_empty() {
            doc.add_heading(title, 1);
        }
    }

    let mut table: Vec<Vec<String>> = Vec::new();
    for line in lines {
        if let Some(cells) = table_cells(line) {
            if !is_separator_row(&cells) {
                table.push(cells);
            }
            continue;
        }
        if line.trim().starts_with('|') {
            continue;
        }
        doc.add_table(std::mem::take(&mut table));
        match LineKind::classify(line) {
            LineKind::Heading { text, .. } => doc.add_heading(text, 2),
            LineKind::Bullet(text) => doc.add_bullet(text),
            LineKind::Paragraph(text) => doc.add_paragraph(text),
            LineKind::Blank => {}
        }
    }
    doc.add_table(table);
}
