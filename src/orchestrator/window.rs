//! Windower
//!
//! Flattens paragraphs into one word stream and cuts it into overlapping
//! fixed-size windows. Paragraph breaks become ordinary whitespace.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::utils::text::{last_words, skip_words};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub index: usize,
    /// Offset of the first word in the flattened stream.
    pub start_word: usize,
    pub word_count: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windower {
    size: usize,
    overlap: usize,
}

impl Windower {
    pub fn new(size: usize, overlap: usize) -> PipelineResult<Self> {
        if size == 0 || overlap >= size {
            return Err(PipelineError::InvalidConfiguration(format!(
                "window overlap {} must be smaller than window size {}",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Window `i` starts at word `i * (size - overlap)`. Cutting stops once
    /// a window reaches the end of the stream, so no trailing window is made
    /// of overlap alone.
    pub fn split<S: AsRef<str>>(&self, paragraphs: &[S]) -> Vec<Window> {
        let words: Vec<&str> = paragraphs
            .iter()
            .flat_map(|p| p.as_ref().split_whitespace())
            .collect();

        let step = self.size - self.overlap;
        let mut windows = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let end = (start + self.size).min(words.len());
            windows.push(Window {
                index: windows.len(),
                start_word: start,
                word_count: end - start,
                text: words[start..end].join(" "),
            });
            if end == words.len() {
                break;
            }
            start += step;
        }

        debug!(
            "Split {} words into {} windows (size {}, overlap {})",
            words.len(),
            windows.len(),
            self.size,
            self.overlap
        );
        windows
    }

    /// Joins processed windows back into one text. Where the head of a
    /// window still repeats the tail of the previous one word for word, the
    /// repeat is dropped and the two are joined inline; otherwise they are
    /// kept as separate paragraphs.
    pub fn stitch<S: AsRef<str>>(&self, windows: &[S]) -> String {
        let min_match = self.overlap.min(3).max(1);
        let mut out = String::new();

        for window in windows {
            let window = window.as_ref().trim();
            if window.is_empty() {
                continue;
            }
            if out.is_empty() {
                out.push_str(window);
                continue;
            }

            let shared = shared_boundary(&out, window, self.overlap.max(min_match));
            if shared >= min_match && self.overlap > 0 {
                let rest = skip_words(window, shared);
                if !rest.is_empty() {
                    let gap = &window[..window.len() - rest.len()];
                    let gap_ws = &gap[gap.trim_end().len()..];
                    out.push_str(if gap_ws.contains('\n') { "\n" } else { " " });
                    out.push_str(rest);
                }
            } else {
                out.push_str("\n\n");
                out.push_str(window);
            }
        }
        out
    }
}

/// Largest `k <= max` such that the last `k` words of `left` equal the
/// first `k` words of `right`.
fn shared_boundary(left: &str, right: &str, max: usize) -> usize {
    let tail = last_words(left, max);
    let head: Vec<&str> = right.split_whitespace().take(max).collect();
    let limit = tail.len().min(head.len());

    (1..=limit)
        .rev()
        .find(|&k| tail[tail.len() - k..] == head[..k])
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(Windower::new(10, 10), Err(PipelineError::InvalidConfiguration(_))));
        assert!(Windower::new(0, 0).is_err());
        assert!(Windower::new(10, 9).is_ok());
    }

    #[test]
    fn test_offsets_and_sizes() {
        let windower = Windower::new(10, 3).unwrap();
        let windows = windower.split(&[numbered(24)]);
        let starts: Vec<usize> = windows.iter().map(|w| w.start_word).collect();
        assert_eq!(starts, vec![0, 7, 14]);
        assert_eq!(windows[0].word_count, 10);
        assert_eq!(windows[1].word_count, 10);
        assert_eq!(windows[2].word_count, 10);
        assert!(windows[1].text.starts_with("w7 w8 w9"));
    }

    #[test]
    fn test_last_window_may_be_short() {
        let windower = Windower::new(10, 2).unwrap();
        let windows = windower.split(&[numbered(12)]);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].word_count, 4);
        assert_eq!(windows[1].text, "w8 w9 w10 w11");
    }

    #[test]
    fn test_paragraph_breaks_become_whitespace() {
        let windower = Windower::new(5, 1).unwrap();
        let windows = windower.split(&["one two", "three\nfour", "five six"]);
        assert_eq!(windows[0].text, "one two three four five");
        assert_eq!(windows[1].text, "five six");
    }

    #[test]
    fn test_empty_input_has_no_windows() {
        let windower = Windower::new(5, 1).unwrap();
        assert!(windower.split::<&str>(&[]).is_empty());
        assert!(windower.split(&["   "]).is_empty());
    }

    #[test]
    fn test_stitch_reconstructs_unchanged_windows() {
        let windower = Windower::new(10, 3).unwrap();
        let text = numbered(25);
        let windows: Vec<String> = windower.split(&[text.clone()]).into_iter().map(|w| w.text).collect();
        assert_eq!(windower.stitch(&windows), text);
    }

    #[test]
    fn test_stitch_keeps_rewritten_boundaries_apart() {
        let windower = Windower::new(10, 3).unwrap();
        let stitched = windower.stitch(&["first part ends here", "a fresh start"]);
        assert_eq!(stitched, "first part ends here\n\na fresh start");
    }

    #[test]
    fn test_stitch_preserves_structure_after_overlap() {
        let windower = Windower::new(10, 3).unwrap();
        let stitched = windower.stitch(&["intro text x y z", "x y z\n- bullet one"]);
        assert_eq!(stitched, "intro text x y z\n- bullet one");
    }
}
