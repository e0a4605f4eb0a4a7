//! Document Writer
//!
//! Serialises a `StructuredDocument` to `.docx` with docx-rs.

use std::fs::File;
use std::path::Path;

use docx_rs::{
    AbstractNumbering, AlignmentType, BreakType, Docx, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, Paragraph, Run, Start, Table, TableCell, TableRow,
};
use tracing::info;

use super::{Block, StructuredDocument};
use crate::error::{PipelineError, PipelineResult};

const BULLET_NUMBERING: usize = 1;

pub trait DocumentWriter: Send + Sync {
    fn write(&self, doc: &StructuredDocument, path: &Path) -> PipelineResult<()>;
}

/// Font sizes are in half-points, as docx stores them.
#[derive(Debug, Clone)]
pub struct DocxWriter {
    pub title_size: usize,
    pub heading1_size: usize,
    pub heading2_size: usize,
    pub body_size: usize,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self { title_size: 40, heading1_size: 28, heading2_size: 24, body_size: 22 }
    }
}

impl DocxWriter {
    fn text_run(&self, text: &str, size: usize) -> Run {
        Run::new().add_text(text).size(size)
    }

    fn heading_run(&self, text: &str, size: usize, color: Option<&str>) -> Run {
        let run = self.text_run(text, size).bold();
        match color {
            Some(color) => run.color(color),
            None => run,
        }
    }

    fn table(&self, rows: &[Vec<String>]) -> Table {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cells = row
                    .iter()
                    .map(|cell| {
                        let run = if i == 0 {
                            self.text_run(cell, self.body_size).bold()
                        } else {
                            self.text_run(cell, self.body_size)
                        };
                        TableCell::new().add_paragraph(Paragraph::new().add_run(run))
                    })
                    .collect();
                TableRow::new(cells)
            })
            .collect();
        Table::new(rows)
    }

    pub fn build(&self, doc: &StructuredDocument) -> Docx {
        let color = doc.heading_color.as_deref();
        let mut docx = Docx::new();

        if doc.has_bullets() {
            docx = docx
                .add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("•"),
                    LevelJc::new("left"),
                )))
                .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING));
        }

        for block in &doc.blocks {
            docx = match block {
                Block::Title(text) => docx.add_paragraph(
                    Paragraph::new()
                        .add_run(self.heading_run(text, self.title_size, color))
                        .align(AlignmentType::Center),
                ),
                Block::Heading { level, text } => {
                    let size = if *level <= 1 { self.heading1_size } else { self.heading2_size };
                    docx.add_paragraph(
                        Paragraph::new()
                            .add_run(self.heading_run(text, size, color))
                            .align(AlignmentType::Left),
                    )
                }
                Block::Paragraph(text) => docx.add_paragraph(
                    Paragraph::new()
                        .add_run(self.text_run(text, self.body_size))
                        .align(AlignmentType::Left),
                ),
                Block::Caption(text) => docx.add_paragraph(
                    Paragraph::new()
                        .add_run(self.text_run(text, self.body_size))
                        .align(AlignmentType::Center),
                ),
                Block::Bullet(text) => docx.add_paragraph(
                    Paragraph::new()
                        .add_run(self.text_run(text, self.body_size))
                        .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0)),
                ),
                Block::Table(rows) => docx.add_table(self.table(rows)),
                Block::PageBreak => {
                    docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
                }
            };
        }
        docx
    }
}

impl DocumentWriter for DocxWriter {
    fn write(&self, doc: &StructuredDocument, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.build(doc)
            .build()
            .pack(file)
            .map_err(|e| PipelineError::Document(format!("failed to write {}: {:?}", path.display(), e)))?;
        info!("Document written: {} ({} blocks)", path.display(), doc.blocks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_all_block_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.docx");

        let mut doc = StructuredDocument::new().with_heading_color("003296");
        doc.add_title("Report");
        doc.add_caption("Job ID: abc12345");
        doc.add_page_break();
        doc.add_heading("Summary", 1);
        doc.add_heading("Detail", 2);
        doc.add_paragraph("Body");
        doc.add_bullet("point");
        doc.add_table(vec![
            vec!["Before".into(), "After".into()],
            vec!["utilise".into(), "use".into()],
        ]);

        DocxWriter::default().write(&doc, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
