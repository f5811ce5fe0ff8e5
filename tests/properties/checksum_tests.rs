//! Checksum determinism and sensitivity properties.

use proptest::prelude::*;

use skillsync::core::checksum::{checksum_tree, FileTree};

fn arb_tree() -> impl Strategy<Value = FileTree> {
    prop::collection::btree_map(
        r"[a-z][a-z0-9_\-]{0,12}(/[a-z][a-z0-9_\-]{0,12}){0,2}\.(md|txt|sh)",
        prop::collection::vec(any::<u8>(), 0..64),
        1..8,
    )
}

proptest! {
    #[test]
    fn insertion_order_does_not_matter(tree in arb_tree()) {
        // Rebuild the map from reversed entries; BTreeMap re-sorts, and the
        // checksum must agree regardless of how the tree was assembled.
        let reversed: FileTree = tree.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
        prop_assert_eq!(checksum_tree(&tree), checksum_tree(&reversed));
    }

    #[test]
    fn adding_a_file_changes_the_checksum(tree in arb_tree(), content in prop::collection::vec(any::<u8>(), 0..32)) {
        let mut extended = tree.clone();
        extended.insert("zz-added-file.md".to_string(), content);
        prop_assume!(!tree.contains_key("zz-added-file.md"));
        prop_assert_ne!(checksum_tree(&tree), checksum_tree(&extended));
    }

    #[test]
    fn removing_a_file_changes_the_checksum(tree in arb_tree()) {
        let key = tree.keys().next().unwrap().clone();
        let mut shrunk = tree.clone();
        shrunk.remove(&key);
        prop_assert_ne!(checksum_tree(&tree), checksum_tree(&shrunk));
    }

    #[test]
    fn flipping_one_byte_changes_the_checksum(tree in arb_tree()) {
        let key = tree.keys().next().unwrap().clone();
        let mut mutated = tree.clone();
        let content = mutated.get_mut(&key).unwrap();
        if content.is_empty() {
            content.push(1);
        } else {
            content[0] ^= 0xff;
        }
        prop_assert_ne!(checksum_tree(&tree), checksum_tree(&mutated));
    }

    #[test]
    fn renaming_a_file_changes_the_checksum(tree in arb_tree()) {
        let key = tree.keys().next().unwrap().clone();
        prop_assume!(!tree.contains_key("zz-renamed.md"));
        let mut renamed = tree.clone();
        let content = renamed.remove(&key).unwrap();
        renamed.insert("zz-renamed.md".to_string(), content);
        prop_assert_ne!(checksum_tree(&tree), checksum_tree(&renamed));
    }

    #[test]
    fn checksum_is_deterministic(tree in arb_tree()) {
        prop_assert_eq!(checksum_tree(&tree), checksum_tree(&tree.clone()));
    }
}
