// ─── Version Manifest ───
// Fetches the remote version catalog and per-version detail documents.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::RemoteSource;

use super::version_file::{VersionDetail, VersionJson};

/// Top-level catalog document.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    /// URL of the per-version detail document.
    pub url: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(rename = "releaseTime", default)]
    pub release_time: Option<String>,
}

impl VersionManifest {
    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// List official stable versions (release only).
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type.as_deref() == Some("release"))
            .collect()
    }
}

/// Read-only client for the catalog. No caching: every call hits the source.
#[derive(Clone)]
pub struct ManifestClient {
    source: Arc<dyn RemoteSource>,
    manifest_url: String,
}

impl ManifestClient {
    pub fn new(source: Arc<dyn RemoteSource>, manifest_url: impl Into<String>) -> Self {
        Self {
            source,
            manifest_url: manifest_url.into(),
        }
    }

    pub async fn fetch_manifest(&self) -> LauncherResult<VersionManifest> {
        info!("Fetching version manifest from {}", self.manifest_url);
        let raw = self
            .source
            .fetch_text(&self.manifest_url)
            .await
            .map_err(|e| catalog_unavailable(&self.manifest_url, e))?;
        let manifest: VersionManifest =
            serde_json::from_str(&raw).map_err(|e| catalog_unavailable(&self.manifest_url, e))?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    pub async fn list_versions(&self) -> LauncherResult<Vec<VersionEntry>> {
        Ok(self.fetch_manifest().await?.versions)
    }

    /// Look up the catalog entry for `version_id`.
    pub async fn find(&self, version_id: &str) -> LauncherResult<VersionEntry> {
        self.fetch_manifest()
            .await?
            .find_version(version_id)
            .cloned()
            .ok_or_else(|| LauncherError::VersionNotFound(version_id.to_string()))
    }

    #[instrument(skip(self, entry), fields(version = %entry.id))]
    pub async fn get_detail(&self, entry: &VersionEntry) -> LauncherResult<VersionDetail> {
        let raw = self
            .source
            .fetch_text(&entry.url)
            .await
            .map_err(|e| catalog_unavailable(&entry.url, e))?;
        let detail = VersionJson::parse(&raw)
            .map_err(|e| catalog_unavailable(&entry.url, e))?
            .into_detail();
        debug!(
            "Detail for {}: {} libraries, main class {}",
            entry.id,
            detail.libraries.len(),
            detail.main_class
        );
        Ok(detail)
    }
}

fn catalog_unavailable(url: &str, reason: impl std::fmt::Display) -> LauncherError {
    LauncherError::CatalogUnavailable {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}
