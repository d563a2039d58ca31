// ─── Version File ───
// Parses a per-version detail document into the primary artifact and the
// ordered library set.

use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_MAIN_CLASS: &str = "net.minecraft.client.main.Main";

/// The subset of a Mojang version JSON the launcher consumes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: VersionDownloads,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: DownloadArtifact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
}

#[derive(Debug, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// One library to materialize under the local library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    pub remote_url: String,
    /// Location relative to `libraries/`.
    pub relative_path: String,
    pub sha1: Option<String>,
}

/// Resolved view of a version: what to download and what to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDetail {
    pub primary_artifact_url: String,
    pub primary_artifact_sha1: Option<String>,
    pub main_class: String,
    pub libraries: Vec<LibraryRef>,
}

impl VersionJson {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Flatten into a `VersionDetail`, keeping catalog order and skipping
    /// libraries that carry no downloadable artifact.
    pub fn into_detail(self) -> VersionDetail {
        let total = self.libraries.len();
        let libraries: Vec<LibraryRef> = self
            .libraries
            .into_iter()
            .filter_map(|lib| {
                let artifact = lib.downloads.and_then(|d| d.artifact);
                if artifact.is_none() {
                    debug!(
                        "Skipping library without artifact: {}",
                        lib.name.as_deref().unwrap_or("<unnamed>")
                    );
                }
                artifact
            })
            .map(|artifact| LibraryRef {
                remote_url: artifact.url,
                relative_path: artifact.path,
                sha1: artifact.sha1,
            })
            .collect();

        debug!(
            "Version {} lists {} libraries ({} downloadable)",
            self.id.as_deref().unwrap_or("<unknown>"),
            total,
            libraries.len()
        );

        VersionDetail {
            primary_artifact_url: self.downloads.client.url,
            primary_artifact_sha1: self.downloads.client.sha1,
            main_class: self
                .main_class
                .filter(|class| !class.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MAIN_CLASS.to_string()),
            libraries,
        }
    }
}
