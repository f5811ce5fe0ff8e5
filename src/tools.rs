//! Supported tool integrations.
//!
//! Each variant describes one AI coding tool that consumes Skills, with its
//! project-level and global skill directory conventions. The registry is a
//! closed enum so adding a tool is a compile-checked one-variant change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// A supported tool integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    ClaudeCode,
    Cursor,
    Windsurf,
    Codex,
    Trae,
}

impl Tool {
    /// All supported tools, in stable display order.
    pub const ALL: &'static [Self] = &[
        Self::ClaudeCode,
        Self::Cursor,
        Self::Windsurf,
        Self::Codex,
        Self::Trae,
    ];

    /// Stable identifier, also the value stored in the database.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::ClaudeCode => "claude-code",
            Self::Cursor => "cursor",
            Self::Windsurf => "windsurf",
            Self::Codex => "codex",
            Self::Trae => "trae",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ClaudeCode => "Claude Code",
            Self::Cursor => "Cursor",
            Self::Windsurf => "Windsurf",
            Self::Codex => "Codex",
            Self::Trae => "Trae",
        }
    }

    /// Skill directory relative to a project root.
    #[must_use]
    pub const fn project_dir(self) -> &'static str {
        match self {
            Self::ClaudeCode => ".claude/skills",
            Self::Cursor => ".cursor/skills",
            Self::Windsurf => ".windsurf/skills",
            Self::Codex => ".agents/skills",
            Self::Trae => ".trae/skills",
        }
    }

    /// Skill directory relative to the user's home directory.
    #[must_use]
    pub const fn global_dir(self) -> &'static str {
        match self {
            Self::ClaudeCode => ".claude/skills",
            Self::Cursor => ".cursor/skills",
            Self::Windsurf => ".codeium/windsurf/skills",
            Self::Codex => ".agents/skills",
            Self::Trae => ".trae/skills",
        }
    }

    /// Parse a tool id as stored in the database or passed on the CLI.
    pub fn from_id(id: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.id() == id)
            .ok_or_else(|| SyncError::Validation(format!("unsupported tool: {id}")))
    }

    /// Deploy path for a skill under a project root.
    #[must_use]
    pub fn project_skill_path(self, project_root: &Path, skill_name: &str) -> PathBuf {
        project_root.join(self.project_dir()).join(skill_name)
    }

    /// Deploy path for a skill under the given home directory.
    #[must_use]
    pub fn global_skill_path(self, home: &Path, skill_name: &str) -> PathBuf {
        home.join(self.global_dir()).join(skill_name)
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Unique project-level skill directories across all tools.
///
/// Used by the untracked-skill scan so shared conventions (e.g. multiple
/// tools reading `.agents/skills`) are walked once.
#[must_use]
pub fn unique_project_dirs() -> Vec<&'static str> {
    let mut dirs: Vec<&'static str> = Tool::ALL.iter().map(|t| t.project_dir()).collect();
    dirs.sort_unstable();
    dirs.dedup();
    dirs
}
