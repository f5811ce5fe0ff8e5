//! Applying the hunks of `diff(A, B)` to A must reproduce B exactly.

use proptest::prelude::*;

use skillsync::diff::{compute_hunks, DiffHunk};

/// Re-apply hunks to the old text. Context and removed lines advance the
/// cursor through the old lines; context and added lines are emitted.
fn apply_hunks(old: &str, hunks: &[DiffHunk]) -> String {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let mut result = String::new();
    let mut cursor = 0usize;

    for hunk in hunks {
        let hunk_start = hunk.old_start - 1;
        for line in &old_lines[cursor..hunk_start] {
            result.push_str(line);
        }
        cursor = hunk_start;

        for line in &hunk.lines {
            match line.tag {
                ' ' => {
                    result.push_str(&line.content);
                    cursor += 1;
                }
                '-' => cursor += 1,
                '+' => result.push_str(&line.content),
                other => panic!("unexpected tag {other}"),
            }
        }
    }

    for line in &old_lines[cursor..] {
        result.push_str(line);
    }
    result
}

fn arb_text() -> impl Strategy<Value = String> {
    // Short line alphabet keeps diffs interesting: repeated lines force the
    // LCS machinery to actually choose alignments.
    prop::collection::vec(
        prop_oneof![
            Just("alpha".to_string()),
            Just("beta".to_string()),
            Just("gamma".to_string()),
            Just("delta".to_string()),
            "[a-z]{1,8}",
        ],
        0..30,
    )
    .prop_flat_map(|lines| {
        let joined = lines.join("\n");
        prop_oneof![
            Just(joined.clone()),
            Just(if joined.is_empty() {
                joined.clone()
            } else {
                format!("{joined}\n")
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn hunks_round_trip(old in arb_text(), new in arb_text()) {
        let hunks = compute_hunks(&old, &new);
        prop_assert_eq!(apply_hunks(&old, &hunks), new);
    }

    #[test]
    fn identical_inputs_produce_no_hunks(text in arb_text()) {
        prop_assert!(compute_hunks(&text, &text).is_empty());
    }

    #[test]
    fn hunk_counts_match_tagged_lines(old in arb_text(), new in arb_text()) {
        for hunk in compute_hunks(&old, &new) {
            let old_lines = hunk.lines.iter().filter(|l| l.tag != '+').count();
            let new_lines = hunk.lines.iter().filter(|l| l.tag != '-').count();
            prop_assert_eq!(old_lines, hunk.old_count);
            prop_assert_eq!(new_lines, hunk.new_count);
        }
    }
}

#[test]
fn round_trip_concrete_cases() {
    let cases = [
        ("", "hello\n"),
        ("hello\n", ""),
        ("a\nb\nc\n", "a\nB\nc\n"),
        ("a\nb\nc", "a\nb\nc\nd"),
        ("one\ntwo\nthree\n", "zero\none\nthree\nfour\n"),
        ("x", "y"),
    ];
    for (old, new) in cases {
        let hunks = compute_hunks(old, new);
        assert_eq!(apply_hunks(old, &hunks), new, "case {old:?} -> {new:?}");
    }
}
