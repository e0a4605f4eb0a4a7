//! Text Utilities
//!
//! Small word-level helpers shared by the pipeline stages, plus a log
//! preview that keeps both ends of a long window on UTF-8 boundaries.

/// Shortens `content` for log output, keeping a prefix and a suffix.
pub fn preview(content: &str, max_bytes: usize) -> String {
    let content = content.replace('\n', " ");
    if content.len() <= max_bytes {
        return content;
    }
    if max_bytes == 0 {
        return format!("[{} chars]", content.len());
    }

    let half = max_bytes / 2;
    let mut prefix_end = 0;
    for (idx, c) in content.char_indices() {
        let char_end = idx + c.len_utf8();
        if char_end > half {
            break;
        }
        prefix_end = char_end;
    }

    let suffix_target = content.len().saturating_sub(half);
    let mut suffix_start = content.len();
    for (idx, _) in content.char_indices().rev() {
        if idx < suffix_target {
            break;
        }
        suffix_start = idx;
    }
    if suffix_start < prefix_end {
        suffix_start = prefix_end;
    }

    let omitted = content.len() - prefix_end - (content.len() - suffix_start);
    format!(
        "{} ... [{} chars] ... {}",
        &content[..prefix_end],
        omitted,
        &content[suffix_start..]
    )
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Returns the remainder of `text` after its first `n` whitespace-separated
/// words, with the original layout of the remainder untouched.
pub fn skip_words(text: &str, n: usize) -> &str {
    if n == 0 {
        return text;
    }
    let mut seen = 0;
    let mut in_word = false;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                seen += 1;
                in_word = false;
                if seen == n {
                    return text[idx..].trim_start();
                }
            }
        } else {
            in_word = true;
        }
    }
    ""
}

/// Last `n` words of `text` (fewer if the text is shorter).
pub fn last_words(text: &str, n: usize) -> Vec<&str> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].to_vec()
}

pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lowercase_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// True for tokens written entirely in capitals, such as `CCS` or `DPS`.
pub fn is_all_caps(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}
