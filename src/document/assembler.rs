//! Document Assembler
//!
//! Classifies each line of merged text by its leading marker and builds a
//! flat structured document from the result.

use super::StructuredDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    Paragraph(&'a str),
    Blank,
}

impl<'a> LineKind<'a> {
    /// Markers in priority order: `**bold**`, `###`, `##`, `#`, `- `.
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return LineKind::Blank;
        }
        if let Some(inner) = bold_line(line) {
            return LineKind::Heading { level: 1, text: inner };
        }

        const PREFIXES: [(&str, u8); 3] = [("### ", 2), ("## ", 2), ("# ", 1)];
        for (prefix, level) in PREFIXES {
            if let Some(rest) = line.strip_prefix(prefix) {
                return LineKind::Heading { level, text: rest.trim() };
            }
        }

        match line.strip_prefix("- ") {
            Some(rest) => LineKind::Bullet(rest.trim()),
            None => LineKind::Paragraph(line),
        }
    }
}

fn bold_line(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?.strip_suffix("**")?;
    let inner = inner.trim();
    (!inner.is_empty() && !inner.contains("**")).then_some(inner)
}

pub fn assemble(text: &str) -> StructuredDocument {
    let mut doc = StructuredDocument::new();
    for line in text.lines() {
        match LineKind::classify(line) {
            LineKind::Heading { level, text } => doc.add_heading(text, level),
            LineKind::Bullet(text) => doc.add_bullet(text),
            LineKind::Paragraph(text) => doc.add_paragraph(text),
            LineKind::Blank => {}
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;

    #[test]
    fn test_classify_markers() {
        assert_eq!(LineKind::classify("**Key dates**"), LineKind::Heading { level: 1, text: "Key dates" });
        assert_eq!(LineKind::classify("### Detail"), LineKind::Heading { level: 2, text: "Detail" });
        assert_eq!(LineKind::classify("## Section"), LineKind::Heading { level: 2, text: "Section" });
        assert_eq!(LineKind::classify("# Title"), LineKind::Heading { level: 1, text: "Title" });
        assert_eq!(LineKind::classify("- a point"), LineKind::Bullet("a point"));
        assert_eq!(LineKind::classify("Plain text"), LineKind::Paragraph("Plain text"));
        assert_eq!(LineKind::classify("   "), LineKind::Blank);
    }

    #[test]
    fn test_inline_bold_is_a_paragraph() {
        assert_eq!(
            LineKind::classify("**Note** this is **important**"),
            LineKind::Paragraph("**Note** this is **important**")
        );
        assert_eq!(LineKind::classify("#hashtag"), LineKind::Paragraph("#hashtag"));
        assert_eq!(LineKind::classify("-10 degrees"), LineKind::Paragraph("-10 degrees"));
    }

    #[test]
    fn test_assemble() {
        let doc = assemble("**Overview**\n\nWe buy goods.\n- cars\n- vans\n## Next steps");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading { level: 1, text: "Overview".into() },
                Block::Paragraph("We buy goods.".into()),
                Block::Bullet("cars".into()),
                Block::Bullet("vans".into()),
                Block::Heading { level: 2, text: "Next steps".into() },
            ]
        );
    }
}
