//! Document Module
//!
//! A flat structured-document model shared by the assembler, the audit
//! report and the writers, plus text extraction from uploaded files.

pub mod assembler;
pub mod extract;
pub mod writer;

pub use assembler::{assemble, LineKind};
pub use extract::{extract_paragraphs, DocxExtractor, PlainTextExtractor, TextExtractor};
pub use writer::{DocumentWriter, DocxWriter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Title(String),
    Heading { level: u8, text: String },
    Paragraph(String),
    /// Centred paragraph, used on cover pages.
    Caption(String),
    Bullet(String),
    /// First row is the header row.
    Table(Vec<Vec<String>>),
    PageBreak,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub blocks: Vec<Block>,
    /// Hex RGB colour for headings, e.g. `003296`.
    pub heading_color: Option<String>,
}

impl StructuredDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heading_color(mut self, color: impl Into<String>) -> Self {
        self.heading_color = Some(color.into());
        self
    }

    pub fn add_title(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Title(text.into()));
    }

    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) {
        self.blocks.push(Block::Heading { level, text: text.into() });
    }

    pub fn add_paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph(text.into()));
    }

    pub fn add_caption(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Caption(text.into()));
    }

    pub fn add_bullet(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Bullet(text.into()));
    }

    pub fn add_table(&mut self, rows: Vec<Vec<String>>) {
        if !rows.is_empty() {
            self.blocks.push(Block::Table(rows));
        }
    }

    pub fn add_page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn has_bullets(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::Bullet(_)))
    }

    /// Plain-marked text: headings as `#`/`##`, bullets as `- `.
    pub fn to_marked_text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Title(t) | Block::Heading { level: 1, text: t } => lines.push(format!("# {}", t)),
                Block::Heading { text, .. } => lines.push(format!("## {}", text)),
                Block::Paragraph(t) | Block::Caption(t) => lines.push(t.clone()),
                Block::Bullet(t) => lines.push(format!("- {}", t)),
                Block::Table(rows) => {
                    lines.extend(rows.iter().map(|r| format!("| {} |", r.join(" | "))));
                }
                Block::PageBreak => {}
            }
        }
        lines.join("\n")
    }
}
