//! Conservative merge of two independently-evolved skill copies.
//!
//! Without a true common ancestor, line-level auto-merge of files modified
//! on both sides risks silent data loss, so only unambiguous cases are
//! auto-resolved: identical content, and files present on one side only.
//! With a base snapshot (e.g. the last-synced backup) the trivial one-side
//! -changed cases resolve automatically and one-side deletions surface as
//! keep-or-delete conflicts.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::checksum::FileTree;
use crate::error::{Result, SyncError};
use crate::utils::fs::{read_tree, FileFailure};

/// Per-file merge classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeFileStatus {
    /// Byte-identical on both sides.
    Unchanged,
    /// Present only in the left (library) tree.
    AddedLeft,
    /// Present only in the right (deployment) tree.
    AddedRight,
    /// Present in base and right, deleted on the left. Manual choice.
    DeletedLeft,
    /// Present in base and left, deleted on the right. Manual choice.
    DeletedRight,
    /// Resolved automatically against the base (one side unchanged).
    AutoMerged,
    /// Differing content on both sides. Manual choice.
    Conflict,
}

impl MergeFileStatus {
    /// Whether this file needs a [`MergeResolution`] before applying.
    #[must_use]
    pub const fn needs_resolution(self) -> bool {
        matches!(self, Self::DeletedLeft | Self::DeletedRight | Self::Conflict)
    }
}

/// Merge outcome for a single path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeFileEntry {
    pub path: String,
    pub status: MergeFileStatus,
    /// Auto-resolved content; `None` when a manual choice is required.
    pub merged_content: Option<Vec<u8>>,
    pub left_content: Option<Vec<u8>>,
    pub right_content: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub files: Vec<MergeFileEntry>,
    pub auto_merged_count: usize,
    pub conflict_count: usize,
    pub total_files: usize,
}

impl MergeResult {
    /// Paths still requiring a manual resolution.
    #[must_use]
    pub fn unresolved_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| f.status.needs_resolution())
            .map(|f| f.path.clone())
            .collect()
    }
}

/// Operator decision for one conflicted path.
///
/// A tagged variant so illegal states (a "merged" choice with no content)
/// are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "choice", content = "content")]
pub enum ResolutionChoice {
    UseLeft,
    UseRight,
    Manual(String),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResolution {
    pub path: String,
    #[serde(flatten)]
    pub choice: ResolutionChoice,
}

/// Outcome of applying a merge: written count plus per-file failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub files_written: usize,
    pub failures: Vec<FileFailure>,
}

/// Two-way merge: no ancestor, so any both-present content difference is a
/// conflict and one-side-only files are kept.
#[must_use]
pub fn merge_trees(left: &FileTree, right: &FileTree) -> MergeResult {
    let paths: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

    let mut files = Vec::new();
    for path in paths {
        let entry = match (left.get(path), right.get(path)) {
            (Some(l), Some(r)) if l == r => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::Unchanged,
                merged_content: Some(l.clone()),
                left_content: None,
                right_content: None,
            },
            (Some(l), Some(r)) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::Conflict,
                merged_content: None,
                left_content: Some(l.clone()),
                right_content: Some(r.clone()),
            },
            (Some(l), None) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::AddedLeft,
                merged_content: Some(l.clone()),
                left_content: Some(l.clone()),
                right_content: None,
            },
            (None, Some(r)) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::AddedRight,
                merged_content: Some(r.clone()),
                left_content: None,
                right_content: Some(r.clone()),
            },
            (None, None) => unreachable!("path came from the union of both key sets"),
        };
        files.push(entry);
    }

    finalize(files)
}

/// Merge with a base snapshot: one-side-unchanged files auto-resolve to the
/// changed side; one-side deletions of a file known to the base surface as
/// keep-or-delete conflicts; files deleted on both sides are dropped.
#[must_use]
pub fn merge_trees_with_base(base: &FileTree, left: &FileTree, right: &FileTree) -> MergeResult {
    let paths: BTreeSet<&String> = base
        .keys()
        .chain(left.keys())
        .chain(right.keys())
        .collect();

    let mut files = Vec::new();
    for path in paths {
        let entry = match (base.get(path), left.get(path), right.get(path)) {
            (_, Some(l), Some(r)) if l == r => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::Unchanged,
                merged_content: Some(l.clone()),
                left_content: None,
                right_content: None,
            },
            (Some(b), Some(l), Some(r)) if l == b => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::AutoMerged,
                merged_content: Some(r.clone()),
                left_content: Some(l.clone()),
                right_content: Some(r.clone()),
            },
            (Some(b), Some(l), Some(r)) if r == b => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::AutoMerged,
                merged_content: Some(l.clone()),
                left_content: Some(l.clone()),
                right_content: Some(r.clone()),
            },
            (_, Some(l), Some(r)) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::Conflict,
                merged_content: None,
                left_content: Some(l.clone()),
                right_content: Some(r.clone()),
            },
            (Some(_), Some(l), None) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::DeletedRight,
                merged_content: None,
                left_content: Some(l.clone()),
                right_content: None,
            },
            (Some(_), None, Some(r)) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::DeletedLeft,
                merged_content: None,
                left_content: None,
                right_content: Some(r.clone()),
            },
            (None, Some(l), None) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::AddedLeft,
                merged_content: Some(l.clone()),
                left_content: Some(l.clone()),
                right_content: None,
            },
            (None, None, Some(r)) => MergeFileEntry {
                path: path.clone(),
                status: MergeFileStatus::AddedRight,
                merged_content: Some(r.clone()),
                left_content: None,
                right_content: Some(r.clone()),
            },
            // Deleted on both sides: nothing left to merge.
            (Some(_), None, None) => continue,
            (None, None, None) => unreachable!("path came from the union of all key sets"),
        };
        files.push(entry);
    }

    finalize(files)
}

fn finalize(files: Vec<MergeFileEntry>) -> MergeResult {
    let total_files = files.len();
    let conflict_count = files.iter().filter(|f| f.status.needs_resolution()).count();
    MergeResult {
        auto_merged_count: total_files - conflict_count,
        conflict_count,
        total_files,
        files,
    }
}

/// Load two (or three) directories and merge them.
pub fn merge_paths(base: Option<&Path>, left: &Path, right: &Path) -> Result<MergeResult> {
    if !left.exists() {
        return Err(SyncError::PathUnavailable {
            path: left.to_path_buf(),
        });
    }
    if !right.exists() {
        return Err(SyncError::PathUnavailable {
            path: right.to_path_buf(),
        });
    }
    let left_tree = read_tree(left)?;
    let right_tree = read_tree(right)?;
    match base {
        Some(base) if base.exists() => {
            let base_tree = read_tree(base)?;
            Ok(merge_trees_with_base(&base_tree, &left_tree, &right_tree))
        }
        _ => Ok(merge_trees(&left_tree, &right_tree)),
    }
}

/// Write a merge result to `target`.
///
/// Refuses to run while any conflicted path lacks a resolution. Files are
/// written independently: a failure on one path leaves already-written
/// files in place and is reported in the returned failure list.
pub fn apply_merge(
    target: &Path,
    result: &MergeResult,
    resolutions: &[MergeResolution],
) -> Result<ApplyReport> {
    for resolution in resolutions {
        if !result.files.iter().any(|f| f.path == resolution.path) {
            return Err(SyncError::Validation(format!(
                "resolution for unknown path: {}",
                resolution.path
            )));
        }
    }

    let unresolved: Vec<String> = result
        .unresolved_paths()
        .into_iter()
        .filter(|p| !resolutions.iter().any(|r| &r.path == p))
        .collect();
    if !unresolved.is_empty() {
        return Err(SyncError::MergeConflictUnresolved { paths: unresolved });
    }

    std::fs::create_dir_all(target)?;

    let mut report = ApplyReport::default();
    for file in &result.files {
        let resolution = resolutions.iter().find(|r| r.path == file.path);
        let content: Option<Vec<u8>> = match resolution.map(|r| &r.choice) {
            Some(ResolutionChoice::UseLeft) => {
                Some(file.left_content.clone().ok_or_else(|| {
                    SyncError::Validation(format!("{} has no left content", file.path))
                })?)
            }
            Some(ResolutionChoice::UseRight) => {
                Some(file.right_content.clone().ok_or_else(|| {
                    SyncError::Validation(format!("{} has no right content", file.path))
                })?)
            }
            Some(ResolutionChoice::Manual(text)) => Some(text.clone().into_bytes()),
            Some(ResolutionChoice::Delete) => None,
            None => file.merged_content.clone(),
        };

        let file_path = {
            let mut p = target.to_path_buf();
            for part in file.path.split('/') {
                p.push(part);
            }
            p
        };

        match content {
            Some(bytes) => {
                let write_result = file_path
                    .parent()
                    .map_or(Ok(()), std::fs::create_dir_all)
                    .and_then(|()| std::fs::write(&file_path, &bytes));
                match write_result {
                    Ok(()) => report.files_written += 1,
                    Err(err) => report.failures.push(FileFailure {
                        path: file.path.clone(),
                        error: err.to_string(),
                    }),
                }
            }
            None => {
                if file_path.exists() {
                    if let Err(err) = std::fs::remove_file(&file_path) {
                        report.failures.push(FileFailure {
                            path: file.path.clone(),
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    Ok(report)
}
