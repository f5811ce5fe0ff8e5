//! Remote catalog client.
//!
//! One tree request per repository; the checker never fetches file
//! contents during an update check.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SyncError};

/// One entry of a repository tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl RemoteEntry {
    /// Whether this entry is a folder (skills are folders in the catalog).
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.entry_type == "tree"
    }
}

/// Abstract catalog access, so the checker is testable without a network.
pub trait CatalogClient {
    /// Fetch the full tree of `owner/repo` at its default branch head.
    fn fetch_repo_tree(&self, owner_repo: &str) -> Result<Vec<RemoteEntry>>;
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<RemoteEntry>,
}

/// Blocking HTTP catalog client against a GitHub-style trees API.
pub struct HttpCatalog {
    base: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpCatalog {
    pub fn new(base: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skillsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }
}

impl CatalogClient for HttpCatalog {
    fn fetch_repo_tree(&self, owner_repo: &str) -> Result<Vec<RemoteEntry>> {
        if owner_repo.split('/').count() != 2 {
            return Err(SyncError::Validation(format!(
                "expected owner/repo, got: {owner_repo}"
            )));
        }

        let url = format!("{}/repos/{}/git/trees/HEAD?recursive=1", self.base, owner_repo);
        debug!(%url, "fetching repo tree");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(SyncError::Remote(format!(
                "tree fetch for {owner_repo} returned {}",
                response.status()
            )));
        }

        let body: TreeResponse = response.json()?;
        Ok(body.tree)
    }
}
