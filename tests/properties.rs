use proptest::prelude::*;

use house_style::lexicon::BannedTerms;
use house_style::orchestrator::merger::cleanup;
use house_style::orchestrator::Windower;

fn word() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,8}[.,]?"
}

fn paragraph() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..30).prop_map(|words| words.join(" "))
}

fn merged_line() -> impl Strategy<Value = String> {
    prop_oneof![
        paragraph(),
        paragraph().prop_map(|p| format!("- {}", p)),
        paragraph().prop_map(|p| format!("  • {}", p)),
        paragraph().prop_map(|p| format!("* {}", p)),
        paragraph().prop_map(|p| format!("Window 2: {}", p)),
        paragraph().prop_map(|p| format!("1. {}", p.to_lowercase())),
        paragraph().prop_map(|p| format!("“{}”", p)),
        Just(String::new()),
        Just("   ".to_string()),
        Just("•".to_string()),
    ]
}

proptest! {
    /// Stitching unmodified windows gives back every word exactly once.
    #[test]
    fn windows_cover_every_word_once(
        paragraphs in prop::collection::vec(paragraph(), 1..8),
        size in 2usize..40,
        overlap_seed in 0usize..40,
    ) {
        let overlap = overlap_seed % size;
        let windower = Windower::new(size, overlap).unwrap();
        let windows = windower.split(&paragraphs);
        let texts: Vec<&str> = windows.iter().map(|w| w.text.as_str()).collect();

        let original: Vec<&str> = paragraphs.iter().flat_map(|p| p.split_whitespace()).collect();
        let stitched = windower.stitch(&texts);
        let restored: Vec<&str> = stitched.split_whitespace().collect();
        prop_assert_eq!(restored, original);

        for w in &windows {
            prop_assert!(w.word_count <= size);
            prop_assert_eq!(w.start_word, w.index * (size - overlap));
        }
        for w in &windows[..windows.len() - 1] {
            prop_assert_eq!(w.word_count, size);
        }
    }

    #[test]
    fn cleanup_is_a_fixed_point(lines in prop::collection::vec(merged_line(), 0..20)) {
        let once = cleanup(&lines.join("\n"));
        let twice = cleanup(&once);
        prop_assert_eq!(&twice, &once);
        prop_assert!(!once.contains("Window 2:"));
        prop_assert!(!once.starts_with('\n'));
        prop_assert!(!once.ends_with('\n'));
    }

    #[test]
    fn banned_terms_absent_after_apply(paragraph in paragraph()) {
        let terms = BannedTerms::default();
        let text = format!("We utilise and leverage it. {}", paragraph);
        let out = terms.apply(&text);
        prop_assert!(terms.occurrences(&out).iter().all(|t| t != "utilise" && t != "leverage"));
    }
}
