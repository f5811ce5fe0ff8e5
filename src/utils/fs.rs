//! File-tree IO.
//!
//! Each operation reports partial-failure detail (which file failed) rather
//! than an opaque boolean, per the reconciler's recovery requirements.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::checksum::FileTree;
use crate::error::{Result, SyncError};

/// A single file that failed during a multi-file operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of writing a tree: written count plus per-file failures.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct WriteOutcome {
    pub files_written: usize,
    pub failures: Vec<FileFailure>,
}

/// Read every file under `dir` into a path -> content map.
///
/// Relative paths use `/` separators regardless of platform so checksums
/// and diffs are portable.
pub fn read_tree(dir: &Path) -> Result<FileTree> {
    if !dir.exists() {
        return Err(SyncError::PathUnavailable {
            path: dir.to_path_buf(),
        });
    }

    let mut tree = FileTree::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(entry.path())?;
        tree.insert(rel, content);
    }
    Ok(tree)
}

/// Write a tree under `dir`, creating parent directories as needed.
///
/// Files are written independently; a failure on one path does not abort
/// the rest. Already-written files stay in place and the failing paths are
/// reported in the outcome.
pub fn write_tree(dir: &Path, tree: &FileTree) -> Result<WriteOutcome> {
    std::fs::create_dir_all(dir)?;

    let mut outcome = WriteOutcome::default();
    for (rel, content) in tree {
        let target = join_relative(dir, rel);
        let write_result = target
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&target, content));
        match write_result {
            Ok(()) => outcome.files_written += 1,
            Err(err) => outcome.failures.push(FileFailure {
                path: rel.clone(),
                error: err.to_string(),
            }),
        }
    }
    Ok(outcome)
}

/// Replace the contents of `dst` with the tree currently at `src`.
///
/// Returns the number of files copied. The destination is cleared first so
/// files deleted at the source do not linger.
pub fn replace_tree(src: &Path, dst: &Path) -> Result<usize> {
    let tree = read_tree(src)?;
    if dst.exists() {
        std::fs::remove_dir_all(dst)?;
    }
    let outcome = write_tree(dst, &tree)?;
    if let Some(first) = outcome.failures.first() {
        return Err(SyncError::Validation(format!(
            "copy to {} failed at {}: {}",
            dst.display(),
            first.path,
            first.error
        )));
    }
    Ok(outcome.files_written)
}

/// Whether `path` exists.
#[must_use]
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Remove a directory tree. Missing path is not an error.
pub fn remove_tree(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// List immediate subdirectories of `dir` (skill folders under a tool dir).
pub fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

fn join_relative(dir: &Path, rel: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    for part in rel.split('/') {
        path.push(part);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_tree_missing_dir_is_path_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_tree(&tmp.path().join("gone")).unwrap_err();
        assert!(matches!(err, SyncError::PathUnavailable { .. }));
    }

    #[test]
    fn round_trip_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("ref")).unwrap();
        std::fs::write(src.join("SKILL.md"), b"body").unwrap();
        std::fs::write(src.join("ref/notes.md"), b"notes").unwrap();

        let tree = read_tree(&src).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get("ref/notes.md").unwrap(), b"notes");

        let dst = tmp.path().join("dst");
        let outcome = write_tree(&dst, &tree).unwrap();
        assert_eq!(outcome.files_written, 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(read_tree(&dst).unwrap(), tree);
    }

    #[test]
    fn replace_tree_clears_stale_files() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("keep.md"), b"k").unwrap();
        std::fs::write(dst.join("stale.md"), b"s").unwrap();

        let copied = replace_tree(&src, &dst).unwrap();
        assert_eq!(copied, 1);
        assert!(dst.join("keep.md").exists());
        assert!(!dst.join("stale.md").exists());
    }

    #[test]
    fn list_subdirs_ignores_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("a")).unwrap();
        std::fs::write(tmp.path().join("b.md"), b"x").unwrap();
        let dirs = list_subdirs(tmp.path()).unwrap();
        assert_eq!(dirs.len(), 1);
        assert!(dirs[0].ends_with("a"));
    }
}
