//! Configuration loading.
//!
//! Precedence: defaults, then the global config at
//! `~/.config/skillsync/config.toml`, then `config.toml` under the
//! application root, then environment overrides. An explicit `--config`
//! path (or `SKILLSYNC_CONFIG`) replaces the global+root pair.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library root; relative paths resolve against the application root.
    pub root: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("skills"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Backup root; relative paths resolve against the application root.
    pub root: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("backups"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Upper bound for a single file read during reconciliation; protects
    /// against unreachable network-mounted paths.
    #[serde(with = "humantime_serde")]
    pub file_timeout: Duration,
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            file_timeout: Duration::from_secs(5),
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the catalog API.
    pub api_base: String,
    /// Environment variable holding the API token, read at request time.
    pub token_env: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token_env: "SKILLSYNC_TOKEN".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKILLSYNC_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(local) = Self::load_patch(&root.join("config.toml"))? {
                config.merge_patch(local);
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&config_dir.join("skillsync/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| SyncError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SyncError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(library) = patch.library {
            if let Some(root) = library.root {
                self.library.root = root;
            }
        }
        if let Some(backup) = patch.backup {
            if let Some(root) = backup.root {
                self.backup.root = root;
            }
        }
        if let Some(scan) = patch.scan {
            if let Some(timeout) = scan.file_timeout {
                self.scan.file_timeout = timeout;
            }
            if let Some(follow) = scan.follow_symlinks {
                self.scan.follow_symlinks = follow;
            }
        }
        if let Some(remote) = patch.remote {
            if let Some(api_base) = remote.api_base {
                self.remote.api_base = api_base;
            }
            if let Some(token_env) = remote.token_env {
                self.remote.token_env = token_env;
            }
            if let Some(timeout) = remote.request_timeout {
                self.remote.request_timeout = timeout;
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("SKILLSYNC_LIBRARY_ROOT") {
            self.library.root = PathBuf::from(root);
        }
        if let Ok(root) = std::env::var("SKILLSYNC_BACKUP_ROOT") {
            self.backup.root = PathBuf::from(root);
        }
        if let Ok(base) = std::env::var("SKILLSYNC_API_BASE") {
            self.remote.api_base = base;
        }
    }

    /// Library root resolved against the application root.
    #[must_use]
    pub fn library_root(&self, root: &Path) -> PathBuf {
        resolve(root, &self.library.root)
    }

    /// Backup root resolved against the application root.
    #[must_use]
    pub fn backup_root(&self, root: &Path) -> PathBuf {
        resolve(root, &self.backup.root)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    library: Option<LibraryPatch>,
    backup: Option<BackupPatch>,
    scan: Option<ScanPatch>,
    remote: Option<RemotePatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LibraryPatch {
    root: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct BackupPatch {
    root: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ScanPatch {
    #[serde(default, with = "humantime_serde::option")]
    file_timeout: Option<Duration>,
    follow_symlinks: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RemotePatch {
    api_base: Option<String>,
    token_env: Option<String>,
    #[serde(default, with = "humantime_serde::option")]
    request_timeout: Option<Duration>,
}
