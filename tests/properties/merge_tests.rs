//! Merge conservativeness properties.

use proptest::prelude::*;

use skillsync::core::checksum::FileTree;
use skillsync::merge::{merge_trees, merge_trees_with_base, MergeFileStatus};

fn arb_tree() -> impl Strategy<Value = FileTree> {
    prop::collection::btree_map(
        r"[a-z]{1,6}\.md",
        prop::collection::vec(any::<u8>(), 0..24),
        0..6,
    )
}

proptest! {
    #[test]
    fn unchanged_implies_byte_equal(left in arb_tree(), right in arb_tree()) {
        let result = merge_trees(&left, &right);
        for file in &result.files {
            if file.status == MergeFileStatus::Unchanged {
                prop_assert_eq!(left.get(&file.path), right.get(&file.path));
            }
        }
    }

    #[test]
    fn counts_partition_totals(left in arb_tree(), right in arb_tree()) {
        let result = merge_trees(&left, &right);
        prop_assert_eq!(
            result.auto_merged_count + result.conflict_count,
            result.total_files
        );
        prop_assert_eq!(result.total_files, result.files.len());
    }

    #[test]
    fn both_present_differing_is_never_auto(left in arb_tree(), right in arb_tree()) {
        let result = merge_trees(&left, &right);
        for file in &result.files {
            let left_content = left.get(&file.path);
            let right_content = right.get(&file.path);
            if let (Some(l), Some(r)) = (left_content, right_content) {
                if l != r {
                    prop_assert_eq!(file.status, MergeFileStatus::Conflict);
                    prop_assert!(file.merged_content.is_none());
                }
            }
        }
    }

    #[test]
    fn with_base_counts_partition_totals(
        base in arb_tree(),
        left in arb_tree(),
        right in arb_tree(),
    ) {
        let result = merge_trees_with_base(&base, &left, &right);
        prop_assert_eq!(
            result.auto_merged_count + result.conflict_count,
            result.total_files
        );
    }

    #[test]
    fn with_base_never_invents_content(
        base in arb_tree(),
        left in arb_tree(),
        right in arb_tree(),
    ) {
        // Every auto-resolved content must come verbatim from one side.
        let result = merge_trees_with_base(&base, &left, &right);
        for file in &result.files {
            if let Some(merged) = &file.merged_content {
                let from_left = left.get(&file.path) == Some(merged);
                let from_right = right.get(&file.path) == Some(merged);
                prop_assert!(from_left || from_right);
            }
        }
    }
}
