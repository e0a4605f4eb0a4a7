//! House style rule set the auditor scores documents against.

pub const RULES: &[&str] = &[
    "Use plain English.",
    "Write in short sentences.",
    "Use active voice.",
    "Avoid jargon and legalistic language.",
    "Use correct headings and structure for easy navigation.",
    "Avoid unnecessary formatting like underline or italics.",
    "Provide meaningful link text (not \"click here\").",
    "Always use sentence case for headings.",
    "Use bold for headings (never underline or italicise).",
    "Separate paragraphs with a blank line.",
    "Bullet points must start with a lowercase letter unless it is a proper noun.",
    "No punctuation at the end of bullet points unless full sentences.",
    "Do not use Oxford commas.",
    "Avoid long bullet lists; split if necessary.",
    "Maintain left alignment for all text (never justified).",
    "Always write in UK English spelling.",
    "Avoid American English (\"organisation\" not \"organization\").",
    "Avoid Latin or non-English words (do not use \"etc.\", \"eg.\", \"ie.\").",
    "Use simple, common words instead of complex alternatives.",
    "Avoid exclamation marks.",
    "Do not use semicolons.",
    "Use \"you\" and \"we\" rather than \"the user\" or \"Crown Commercial Service\" in text.",
    "Avoid passive voice.",
    "Write numbers as numerals (1, 2, 3) not words, except at the start of sentences.",
    "Use commas for numbers over 1,000 (1,200).",
    "Use the % symbol for percentages (10% not 10 percent).",
    "Round currency values sensibly unless exact figures are critical.",
    "Do not mix number formats within a list.",
    "For ranges, use \"to\" not hyphens (10 to 20).",
    "Avoid corporate jargon (\"leverage\", \"synergy\").",
    "Use direct, clear instructions.",
    "Replace vague words (\"various\", \"several\") with specific details.",
    "Replace jargon and buzzwords with plain alternatives.",
    "Avoid \"world-class\", \"cutting-edge\", \"best practice\" type phrases.",
    "Use only UK English.",
    "Avoid contractions in formal content (\"do not\" instead of \"don't\").",
    "Avoid political or controversial words.",
    "Avoid slang or overly casual language.",
    "Spell Crown Commercial Service in full on first use, then CCS.",
    "Expand acronyms in full at first mention.",
    "Capitalise official names and services (\"Digital Marketplace\").",
    "Keep the CCS brand tone: clear, confident, trustworthy.",
    "Never use the CCS logo incorrectly.",
    "Structure pages to be scannable with headings, short paragraphs and bullet points.",
    "Put important information at the top.",
    "Keep sentences and paragraphs short.",
    "Use meaningful link labels.",
    "Avoid duplicate content.",
    "Do not refer to download sizes or formats unnecessarily (\"PDF\").",
    "Expand acronyms in body text, even if expanded in headings.",
    "Proper noun references stay capitalised throughout.",
    "Keep tense consistent throughout a document.",
    "Only use quotation marks for direct speech or quotes.",
    "Avoid overuse of bold text (only headings).",
    "Do not start headings with numbers unless essential.",
    "Use parallel sentence structures when listing items.",
    "Keep formatting consistent (bullet styles, numbering).",
    "Make documents clear for screen readers (logical reading order).",
    "Use appropriate alt text for any included images.",
    "Tables must have headers and clear structure.",
    "Prefer positive phrasing over negative where appropriate.",
    "Focus on clarity, simplicity and user needs at every point.",
];

/// The rule list as numbered lines, `1. Use plain English.` onwards.
pub fn numbered_rules() -> String {
    RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_numbering() {
        assert_eq!(RULES.len(), 62);
        let text = numbered_rules();
        assert!(text.starts_with("1. Use plain English."));
        assert!(text.contains("\n13. Do not use Oxford commas."));
        assert!(text.ends_with("62. Focus on clarity, simplicity and user needs at every point."));
    }
}
