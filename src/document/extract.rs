//! Text Extraction
//!
//! Turns an uploaded file into ordered, non-empty paragraphs. List
//! paragraphs in `.docx` files come back prefixed with `- ` so bullet
//! structure survives into the pipeline.

use std::path::Path;

use docx_rs::{read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

pub trait TextExtractor: Send + Sync {
    /// Lowercase file extensions this extractor understands.
    fn extensions(&self) -> &'static [&'static str];

    fn extract(&self, bytes: &[u8]) -> PipelineResult<Vec<String>>;
}

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["docx"]
    }

    fn extract(&self, bytes: &[u8]) -> PipelineResult<Vec<String>> {
        let docx = read_docx(bytes).map_err(|e| PipelineError::Document(format!("unreadable docx: {:?}", e)))?;

        let mut paragraphs = Vec::new();
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(para) = child {
                let text = paragraph_text(para);
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if para.property.numbering_property.is_some() {
                    paragraphs.push(format!("- {}", text));
                } else {
                    paragraphs.push(text.to_string());
                }
            }
        }
        Ok(paragraphs)
    }
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut parts = Vec::new();
    for child in &para.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => parts.push(t.text.as_str()),
                    RunChild::Tab(_) => parts.push(" "),
                    _ => {}
                }
            }
        }
    }
    parts.concat()
}

/// UTF-8 text; blank lines and line breaks both end a paragraph.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn extract(&self, bytes: &[u8]) -> PipelineResult<Vec<String>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PipelineError::Document(format!("text file is not UTF-8: {}", e)))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Lowercase extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_lowercase)
}

pub fn extractor_for(path: &Path) -> PipelineResult<Box<dyn TextExtractor>> {
    let ext = extension_of(path).unwrap_or_default();
    let candidates: [Box<dyn TextExtractor>; 2] = [Box::new(DocxExtractor), Box::new(PlainTextExtractor)];
    candidates
        .into_iter()
        .find(|e| e.extensions().contains(&ext.as_str()))
        .ok_or_else(|| PipelineError::UnsupportedFormat(format!("cannot extract text from '.{}' files", ext)))
}

pub fn is_supported(path: &Path) -> bool {
    extractor_for(path).is_ok()
}

pub fn extract_paragraphs(path: &Path) -> PipelineResult<Vec<String>> {
    let extractor = extractor_for(path)?;
    let bytes = std::fs::read(path)?;
    let paragraphs = extractor.extract(&bytes)?;
    debug!("Extracted {} paragraphs from {}", paragraphs.len(), path.display());
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::document::{DocumentWriter, DocxWriter, StructuredDocument};

    #[test]
    fn test_plain_text_paragraphs() {
        let paragraphs = PlainTextExtractor.extract(b"First line\n\n  \nSecond line  \n").unwrap();
        assert_eq!(paragraphs, vec!["First line", "Second line"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extract_paragraphs(Path::new("report.pdf")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
        assert!(!is_supported(Path::new("notes.odt")));
        assert!(is_supported(Path::new("Notes.DOCX")));
    }

    #[test]
    fn test_txt_file_on_disk() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Alpha\nBeta").unwrap();
        assert_eq!(extract_paragraphs(file.path()).unwrap(), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_docx_round_trip_keeps_bullets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let mut doc = StructuredDocument::new();
        doc.add_heading("Overview", 1);
        doc.add_paragraph("We buy goods.");
        doc.add_bullet("cars and vans");
        DocxWriter::default().write(&doc, &path).unwrap();

        let paragraphs = extract_paragraphs(&path).unwrap();
        assert_eq!(paragraphs, vec!["Overview", "We buy goods.", "- cars and vans"]);
    }

    #[test]
    fn test_garbage_docx_is_document_error() {
        let err = DocxExtractor.extract(b"not a zip").unwrap_err();
        assert!(matches!(err, PipelineError::Document(_)));
    }
}
