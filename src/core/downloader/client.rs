use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha1::{Digest, Sha1};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::RemoteSource;

/// What `ensure` did to satisfy a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The file was already present; nothing was transferred.
    Present,
    /// The file was fetched, with this many bytes written.
    Downloaded(u64),
}

/// Idempotent download-if-missing fetcher.
///
/// Presence is the only check by default: a file that exists is never
/// re-fetched, even if a previous run left it truncated. With
/// `verify_checksums` enabled, artifacts that come with a SHA-1 are
/// re-checked and re-fetched on mismatch.
#[derive(Clone)]
pub struct Downloader {
    source: Arc<dyn RemoteSource>,
    verify_checksums: bool,
}

impl Downloader {
    pub fn new(source: Arc<dyn RemoteSource>) -> Self {
        Self {
            source,
            verify_checksums: false,
        }
    }

    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Make sure `dest` exists locally, downloading `url` if it does not.
    pub async fn ensure(&self, url: &str, dest: &Path) -> LauncherResult<EnsureOutcome> {
        self.ensure_with_sha1(url, dest, None).await
    }

    /// Like [`ensure`](Self::ensure), with an optional expected SHA-1 that is
    /// only consulted when checksum verification is enabled.
    pub async fn ensure_with_sha1(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<EnsureOutcome> {
        let expected = sha1_expected.filter(|_| self.verify_checksums);

        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            let Some(expected) = expected else {
                return Ok(EnsureOutcome::Present);
            };
            if Self::validate_sha1(dest, expected).await? {
                return Ok(EnsureOutcome::Present);
            }
            warn!("Checksum mismatch for {:?}, fetching again", dest);
        }

        self.download_file(url, dest, expected).await
    }

    /// Stream `url` into `dest` through a temporary sibling file, so a failed
    /// transfer never leaves a partial file at `dest`.
    async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<EnsureOutcome> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let part = partial_path(dest);
        let written = match self.source.download(url, &part).await {
            Ok(written) => written,
            Err(err) => {
                warn!("Download of {} failed: {}", url, err);
                let _ = tokio::fs::remove_file(&part).await;
                return Err(download_failed(url, err));
            }
        };

        if written == 0 {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(download_failed(url, "server returned an empty body"));
        }

        if let Some(expected) = sha1_expected {
            if !Self::validate_sha1(&part, expected).await? {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(download_failed(
                    url,
                    format!("SHA-1 mismatch, expected {}", expected),
                ));
            }
        }

        if let Err(err) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(LauncherError::io(dest, err));
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(EnsureOutcome::Downloaded(written))
    }

    /// Validate an existing file's SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!("{}.{}.part", name, Uuid::new_v4()))
}

fn download_failed(url: &str, reason: impl std::fmt::Display) -> LauncherError {
    LauncherError::DownloadFailed {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::testing::StaticSource;

    const URL: &str = "https://libraries.test/a/a-1.jar";

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let source = Arc::new(StaticSource::new().with(URL, b"jar-bytes".to_vec()));
        let downloader = Downloader::new(source.clone());
        let dest = temp.path().join("libraries/a/a-1.jar");

        let first = downloader.ensure(URL, &dest).await.unwrap();
        let second = downloader.ensure(URL, &dest).await.unwrap();

        assert_eq!(first, EnsureOutcome::Downloaded(9));
        assert_eq!(second, EnsureOutcome::Present);
        assert_eq!(source.download_count(), 1);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar-bytes");
    }

    #[tokio::test]
    async fn present_file_is_trusted_without_verification() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("client.jar");
        std::fs::write(&dest, b"truncated").unwrap();
        let source = Arc::new(StaticSource::new().with(URL, b"full".to_vec()));
        let downloader = Downloader::new(source.clone());

        let outcome = downloader
            .ensure_with_sha1(URL, &dest, Some("0000"))
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Present);
        assert_eq!(source.download_count(), 0);
        assert_eq!(std::fs::read(&dest).unwrap(), b"truncated");
    }

    #[tokio::test]
    async fn failed_transfer_leaves_no_file_behind() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("libraries/missing.jar");
        let downloader = Downloader::new(Arc::new(StaticSource::new()));

        let err = downloader.ensure(URL, &dest).await.unwrap_err();

        assert!(matches!(err, LauncherError::DownloadFailed { ref url, .. } if url == URL));
        let leftovers: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_never_placed() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("versions/1.20.4.jar");
        let source = Arc::new(StaticSource::new().with(URL, Vec::new()));
        let downloader = Downloader::new(source.clone());

        for _ in 0..2 {
            let err = downloader.ensure(URL, &dest).await.unwrap_err();
            assert!(matches!(err, LauncherError::DownloadFailed { .. }));
            assert!(!dest.exists());
        }
        assert_eq!(source.download_count(), 2);
        assert_eq!(std::fs::read_dir(dest.parent().unwrap()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn verification_refetches_corrupted_file() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("client.jar");
        std::fs::write(&dest, b"corrupted").unwrap();
        let source = Arc::new(StaticSource::new().with(URL, b"abc".to_vec()));
        let downloader = Downloader::new(source.clone()).with_checksum_verification(true);
        // sha1("abc")
        let expected = "a9993e364706816aba3e25717850c26c9cd0d89d";

        let outcome = downloader
            .ensure_with_sha1(URL, &dest, Some(expected))
            .await
            .unwrap();
        assert_eq!(outcome, EnsureOutcome::Downloaded(3));

        let again = downloader
            .ensure_with_sha1(URL, &dest, Some(expected))
            .await
            .unwrap();
        assert_eq!(again, EnsureOutcome::Present);
        assert_eq!(source.download_count(), 1);
    }

    #[tokio::test]
    async fn verification_rejects_bad_download() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("client.jar");
        let source = Arc::new(StaticSource::new().with(URL, b"abc".to_vec()));
        let downloader = Downloader::new(source).with_checksum_verification(true);

        let err = downloader
            .ensure_with_sha1(URL, &dest, Some("ffff"))
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }
}
