//! Content fingerprinting for skill file sets.
//!
//! Equality of two checksums is bit-for-bit equality of the final digest;
//! inequality does not localize which file changed (that is the diff
//! engine's job).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::utils::fs::read_tree;

/// A skill's file set: relative path -> content bytes.
///
/// `BTreeMap` keeps iteration ordered by path, which the checksum relies on.
pub type FileTree = BTreeMap<String, Vec<u8>>;

/// A content fingerprint over a whole file set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Checksum {
    fn from(hex: String) -> Self {
        Self(hex)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the checksum of a file tree.
///
/// Two-level digest: each file contributes `sha256(path \0 content)`, the
/// per-file digests are concatenated in path order, and the result is
/// hashed again. Deterministic under insertion order, sensitive to path,
/// content, and presence of every file, insensitive to filesystem metadata.
///
/// Returns `None` for an empty tree — a skill with no files has no
/// fingerprint, matching the nullable checksum columns in the database.
#[must_use]
pub fn checksum_tree(tree: &FileTree) -> Option<Checksum> {
    if tree.is_empty() {
        return None;
    }

    let mut outer = Sha256::new();
    for (path, content) in tree {
        let mut inner = Sha256::new();
        inner.update(path.as_bytes());
        inner.update([0u8]);
        inner.update(content);
        outer.update(inner.finalize());
    }
    Some(Checksum(hex::encode(outer.finalize())))
}

/// Read a directory into a tree and checksum it.
///
/// A missing or empty directory yields `Ok(None)`.
pub fn checksum_dir(dir: &Path) -> Result<Option<Checksum>> {
    if !dir.exists() {
        return Ok(None);
    }
    let tree = read_tree(dir)?;
    Ok(checksum_tree(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: &[(&str, &[u8])]) -> FileTree {
        entries
            .iter()
            .map(|(p, c)| ((*p).to_string(), c.to_vec()))
            .collect()
    }

    #[test]
    fn empty_tree_has_no_checksum() {
        assert!(checksum_tree(&FileTree::new()).is_none());
    }

    #[test]
    fn identical_trees_agree() {
        let a = tree(&[("SKILL.md", b"v1"), ("ref/notes.md", b"n")]);
        let b = tree(&[("ref/notes.md", b"n"), ("SKILL.md", b"v1")]);
        assert_eq!(checksum_tree(&a), checksum_tree(&b));
    }

    #[test]
    fn content_change_changes_checksum() {
        let a = tree(&[("SKILL.md", b"v1")]);
        let b = tree(&[("SKILL.md", b"v2")]);
        assert_ne!(checksum_tree(&a), checksum_tree(&b));
    }

    #[test]
    fn path_change_changes_checksum() {
        let a = tree(&[("SKILL.md", b"v1")]);
        let b = tree(&[("skill.md", b"v1")]);
        assert_ne!(checksum_tree(&a), checksum_tree(&b));
    }

    #[test]
    fn added_file_changes_checksum() {
        let a = tree(&[("SKILL.md", b"v1")]);
        let b = tree(&[("SKILL.md", b"v1"), ("extra.md", b"")]);
        assert_ne!(checksum_tree(&a), checksum_tree(&b));
    }

    #[test]
    fn empty_file_is_not_absence() {
        let a = tree(&[("SKILL.md", b"v1"), ("empty.md", b"")]);
        let b = tree(&[("SKILL.md", b"v1")]);
        assert_ne!(checksum_tree(&a), checksum_tree(&b));
    }

    #[test]
    fn checksum_dir_missing_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(checksum_dir(&missing).unwrap().is_none());
    }

    #[test]
    fn checksum_dir_matches_tree() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("SKILL.md"), b"hello").unwrap();
        let from_dir = checksum_dir(tmp.path()).unwrap().unwrap();
        let from_tree = checksum_tree(&tree(&[("SKILL.md", b"hello")])).unwrap();
        assert_eq!(from_dir, from_tree);
    }
}
