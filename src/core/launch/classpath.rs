// ─── Classpath Builder ───
// Materializes the primary artifact and every library of a version locally
// and returns them as an ordered classpath.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument};

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::{LibraryRef, ManifestClient};

/// A version whose files are all present locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClasspath {
    pub version_id: String,
    pub main_class: String,
    /// Element zero is always `versions/<id>.jar`; libraries follow in catalog order.
    pub entries: Vec<PathBuf>,
}

impl ResolvedClasspath {
    pub fn joined(&self) -> String {
        join_classpath(&self.entries)
    }
}

pub struct ClasspathResolver {
    manifest: ManifestClient,
    downloader: Downloader,
    versions_dir: PathBuf,
    libraries_dir: PathBuf,
    concurrency: usize,
}

impl ClasspathResolver {
    pub fn new(
        manifest: ManifestClient,
        downloader: Downloader,
        versions_dir: PathBuf,
        libraries_dir: PathBuf,
    ) -> Self {
        Self {
            manifest,
            downloader,
            versions_dir,
            libraries_dir,
            concurrency: 8,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Resolve `version_id` into an ordered, fully materialized classpath.
    ///
    /// Any failed fetch aborts the whole resolution; a partial classpath is
    /// never returned.
    #[instrument(skip(self))]
    pub async fn resolve(&self, version_id: &str) -> LauncherResult<ResolvedClasspath> {
        let entry = self.manifest.find(version_id).await?;
        let detail = self.manifest.get_detail(&entry).await?;

        let client_jar = self.versions_dir.join(format!("{}.jar", version_id));
        self.downloader
            .ensure_with_sha1(
                &detail.primary_artifact_url,
                &client_jar,
                detail.primary_artifact_sha1.as_deref(),
            )
            .await?;
        ensure_non_empty(&detail.primary_artifact_url, &client_jar).await?;

        let libraries: Vec<LibraryRef> = unique_by_path(&detail.libraries)
            .into_iter()
            .cloned()
            .collect();
        let total = libraries.len();
        let libraries_dir = self.libraries_dir.as_path();
        let downloader = &self.downloader;

        // `buffered` yields in submission order, so the classpath follows the
        // catalog no matter which download finishes first.
        let library_paths: Vec<PathBuf> = stream::iter(libraries)
            .map(|lib| async move {
                let dest = library_dest(libraries_dir, &lib)?;
                downloader
                    .ensure_with_sha1(&lib.remote_url, &dest, lib.sha1.as_deref())
                    .await?;
                ensure_non_empty(&lib.remote_url, &dest).await?;
                Ok::<_, LauncherError>(dest)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut entries = Vec::with_capacity(total + 1);
        entries.push(client_jar);
        entries.extend(library_paths);

        info!(
            "Resolved {} with {} classpath entries",
            version_id,
            entries.len()
        );

        Ok(ResolvedClasspath {
            version_id: version_id.to_string(),
            main_class: detail.main_class,
            entries,
        })
    }
}

/// Libraries in catalog order with repeated relative paths collapsed onto
/// their first occurrence.
fn unique_by_path(libraries: &[LibraryRef]) -> Vec<&LibraryRef> {
    let mut seen = HashSet::new();
    libraries
        .iter()
        .filter(|lib| {
            let first = seen.insert(lib.relative_path.as_str());
            if !first {
                debug!("Duplicate library path (already satisfied): {}", lib.relative_path);
            }
            first
        })
        .collect()
}

/// Local destination of a library, refusing paths that escape the library root.
fn library_dest(libraries_dir: &Path, lib: &LibraryRef) -> LauncherResult<PathBuf> {
    let relative = Path::new(&lib.relative_path);
    let safe = !lib.relative_path.trim().is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !safe {
        return Err(LauncherError::DownloadFailed {
            url: lib.remote_url.clone(),
            reason: format!("refusing library path outside the library root: {}", lib.relative_path),
        });
    }
    Ok(libraries_dir.join(relative))
}

async fn ensure_non_empty(url: &str, path: &Path) -> LauncherResult<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;
    if metadata.len() == 0 {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            reason: format!("{:?} is empty", path),
        });
    }
    Ok(())
}

/// Uses `;` on Windows, `:` on Linux/macOS.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

pub fn join_classpath(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|entry| safe_path_str(entry))
        .collect::<Vec<_>>()
        .join(get_classpath_separator())
}

/// Convert path to string, stripping the `\\?\` prefix canonicalization adds on Windows.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java fails to load classes from extended-length paths.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
