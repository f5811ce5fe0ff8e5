//! Line-level diff between two skill file trees.
//!
//! Pure computation over already-loaded trees; classification first
//! (added/removed/modified/unchanged per path), then Myers-based hunk
//! extraction for modified text files. Binary files are classified by
//! equality only.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::core::checksum::FileTree;
use crate::error::{Result, SyncError};
use crate::utils::fs::read_tree;

/// Number of unchanged context lines captured around each hunk.
const HUNK_CONTEXT: usize = 3;

/// Per-path classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileDiffStatus {
    /// Present on the right side only.
    Added,
    /// Present on the left side only.
    Removed,
    /// Present on both sides with differing content.
    Modified,
    /// Present on both sides, byte-identical.
    Unchanged,
}

/// One tagged line inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    /// `+` added, `-` removed, ` ` context.
    pub tag: char,
    pub content: String,
}

/// A contiguous group of changes with surrounding context.
///
/// Start lines are 1-based; counts include context lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

/// Diff outcome for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiffItem {
    pub path: String,
    pub status: FileDiffStatus,
    /// True when either side is not valid UTF-8; such files carry no hunks.
    pub is_binary: bool,
    pub hunks: Vec<DiffHunk>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub files: Vec<FileDiffItem>,
    pub summary: DiffSummary,
}

/// Diff two file trees.
#[must_use]
pub fn diff_trees(left: &FileTree, right: &FileTree) -> DiffResult {
    let paths: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

    let mut files = Vec::new();
    let mut summary = DiffSummary::default();

    for path in paths {
        match (left.get(path), right.get(path)) {
            (Some(_), None) => {
                summary.removed += 1;
                files.push(FileDiffItem {
                    path: path.clone(),
                    status: FileDiffStatus::Removed,
                    is_binary: false,
                    hunks: Vec::new(),
                });
            }
            (None, Some(_)) => {
                summary.added += 1;
                files.push(FileDiffItem {
                    path: path.clone(),
                    status: FileDiffStatus::Added,
                    is_binary: false,
                    hunks: Vec::new(),
                });
            }
            (Some(l), Some(r)) if l == r => {
                summary.unchanged += 1;
                files.push(FileDiffItem {
                    path: path.clone(),
                    status: FileDiffStatus::Unchanged,
                    is_binary: false,
                    hunks: Vec::new(),
                });
            }
            (Some(l), Some(r)) => {
                summary.modified += 1;
                let (is_binary, hunks) = match (std::str::from_utf8(l), std::str::from_utf8(r)) {
                    (Ok(old), Ok(new)) => (false, compute_hunks(old, new)),
                    _ => (true, Vec::new()),
                };
                files.push(FileDiffItem {
                    path: path.clone(),
                    status: FileDiffStatus::Modified,
                    is_binary,
                    hunks,
                });
            }
            (None, None) => unreachable!("path came from the union of both key sets"),
        }
    }

    DiffResult { files, summary }
}

/// Load two directories and diff them. A missing directory is treated as an
/// empty tree; both missing is an error.
pub fn diff_paths(left: &Path, right: &Path) -> Result<DiffResult> {
    if !left.exists() && !right.exists() {
        return Err(SyncError::Validation(format!(
            "neither {} nor {} exists",
            left.display(),
            right.display()
        )));
    }
    let left_tree = if left.exists() { read_tree(left)? } else { FileTree::new() };
    let right_tree = if right.exists() { read_tree(right)? } else { FileTree::new() };
    Ok(diff_trees(&left_tree, &right_tree))
}

/// Myers diff grouped into hunks with [`HUNK_CONTEXT`] context lines.
#[must_use]
pub fn compute_hunks(old: &str, new: &str) -> Vec<DiffHunk> {
    let diff = TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();

    for group in diff.grouped_ops(HUNK_CONTEXT) {
        let Some(first) = group.first() else { continue };
        let Some(last) = group.last() else { continue };

        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let tag = match change.tag() {
                    ChangeTag::Insert => '+',
                    ChangeTag::Delete => '-',
                    ChangeTag::Equal => ' ',
                };
                lines.push(DiffLine {
                    tag,
                    content: change.value().to_string(),
                });
            }
        }

        hunks.push(DiffHunk {
            old_start: old_range.start + 1,
            old_count: old_range.len(),
            new_start: new_range.start + 1,
            new_count: new_range.len(),
            lines,
        });
    }

    hunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: &[(&str, &str)]) -> FileTree {
        entries
            .iter()
            .map(|(p, c)| ((*p).to_string(), c.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn classifies_all_four_statuses() {
        let left = tree(&[
            ("same.md", "a\n"),
            ("gone.md", "x\n"),
            ("edit.md", "one\ntwo\n"),
        ]);
        let right = tree(&[
            ("same.md", "a\n"),
            ("new.md", "y\n"),
            ("edit.md", "one\nTWO\n"),
        ]);

        let result = diff_trees(&left, &right);
        assert_eq!(result.summary.added, 1);
        assert_eq!(result.summary.removed, 1);
        assert_eq!(result.summary.modified, 1);
        assert_eq!(result.summary.unchanged, 1);

        let edit = result.files.iter().find(|f| f.path == "edit.md").unwrap();
        assert_eq!(edit.status, FileDiffStatus::Modified);
        assert!(!edit.hunks.is_empty());
    }

    #[test]
    fn binary_files_have_no_hunks() {
        let left = tree(&[("blob.bin", "x")]);
        let mut right = FileTree::new();
        right.insert("blob.bin".into(), vec![0xff, 0xfe, 0x00]);

        let result = diff_trees(&left, &right);
        let item = &result.files[0];
        assert_eq!(item.status, FileDiffStatus::Modified);
        assert!(item.is_binary);
        assert!(item.hunks.is_empty());
    }

    #[test]
    fn hunk_positions_are_one_based() {
        let hunks = compute_hunks("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(hunk.old_start, 1);
        assert_eq!(hunk.old_count, 3);
        assert_eq!(hunk.new_start, 1);
        assert_eq!(hunk.new_count, 3);

        let tags: Vec<char> = hunk.lines.iter().map(|l| l.tag).collect();
        assert_eq!(tags, vec![' ', '-', '+', ' ']);
    }

    #[test]
    fn distant_changes_produce_separate_hunks() {
        let old: String = (1..=30).map(|i| format!("line{i}\n")).collect();
        let new = old.replace("line2\n", "LINE2\n").replace("line28\n", "LINE28\n");
        let hunks = compute_hunks(&old, &new);
        assert_eq!(hunks.len(), 2);
    }

    #[test]
    fn identical_text_has_no_hunks() {
        assert!(compute_hunks("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn empty_file_diffs_against_content() {
        let hunks = compute_hunks("", "hello\n");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].new_count, 1);
        assert_eq!(hunks[0].old_count, 0);
    }

    #[test]
    fn diff_paths_rejects_two_missing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let err = diff_paths(&tmp.path().join("a"), &tmp.path().join("b"));
        assert!(err.is_err());
    }
}
