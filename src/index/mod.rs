//! Package index lookups.
//!
//! Registry resources need a tarball URL and checksum for an exact release. The
//! [`PackageIndex`] trait is the seam between formula construction and the index;
//! [`PyPiIndex`] talks to the PyPI JSON API and [`MemoryIndex`] serves fixed
//! answers without network access.

use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::constants::USER_AGENT;
use crate::core::BrewerError;

/// Download location of one release on the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// URL of the chosen distributable file
    pub tarball_url: String,
    /// SHA-256 digest of that file, when the index reports one
    pub sha256: Option<String>,
}

/// Source of release metadata for registry packages.
pub trait PackageIndex: Send + Sync {
    /// Looks up the release of `name` at exactly `version`.
    ///
    /// # Errors
    ///
    /// - [`BrewerError::PackageNotFound`] when the index has no such release
    /// - [`BrewerError::NetworkError`] when the lookup could not complete
    fn release(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<Release, BrewerError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    url: String,
    #[serde(default)]
    digests: HashMap<String, String>,
}

/// Picks the download from a PyPI `/{name}/{version}/json` response body.
///
/// The last entry of `urls` is used; it is usually the most recently uploaded
/// distribution. Returns `None` when the release lists no files.
fn select_release(body: ReleaseResponse) -> Option<Release> {
    let file = body.urls.into_iter().next_back()?;
    Some(Release {
        sha256: file.digests.get("sha256").cloned(),
        tarball_url: file.url,
    })
}

/// Client for the PyPI JSON API (or any index serving the same layout).
#[derive(Debug, Clone)]
pub struct PyPiIndex {
    client: reqwest::Client,
    base_url: String,
}

impl PyPiIndex {
    /// Creates a client for `base_url` whose requests time out after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BrewerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BrewerError::NetworkError {
                operation: "create HTTP client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Release metadata URL for `name` at `version`.
    pub fn release_url(&self, name: &str, version: &str) -> String {
        format!("{}/{}/{}/json", self.base_url, name, version)
    }
}

impl PackageIndex for PyPiIndex {
    async fn release(&self, name: &str, version: &str) -> Result<Release, BrewerError> {
        let url = self.release_url(name, version);
        let operation = format!("fetch release metadata for {name}=={version}");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| BrewerError::NetworkError {
            operation: operation.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BrewerError::PackageNotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }
        if !status.is_success() {
            return Err(BrewerError::NetworkError {
                operation,
                reason: format!("index returned HTTP {status}"),
            });
        }

        let body: ReleaseResponse =
            response.json().await.map_err(|e| BrewerError::NetworkError {
                operation,
                reason: format!("invalid response body: {e}"),
            })?;

        select_release(body).ok_or_else(|| BrewerError::PackageNotFound {
            name: name.to_string(),
            version: version.to_string(),
        })
    }
}

/// Index answering from a fixed table, for offline use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    releases: HashMap<(String, String), Release>,
}

impl MemoryIndex {
    /// Creates an empty index; every lookup fails with `PackageNotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a release for `name` at `version`.
    #[must_use]
    pub fn with_release(mut self, name: &str, version: &str, release: Release) -> Self {
        self.releases.insert((name.to_string(), version.to_string()), release);
        self
    }
}

impl PackageIndex for MemoryIndex {
    async fn release(&self, name: &str, version: &str) -> Result<Release, BrewerError> {
        self.releases.get(&(name.to_string(), version.to_string())).cloned().ok_or_else(|| {
            BrewerError::PackageNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }
        })
    }
}
