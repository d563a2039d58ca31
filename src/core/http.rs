// ─── HTTP ───
// Shared reqwest client plus the transport seam used by the catalog
// client and the artifact fetcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, ClientBuilder};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

const APP_USER_AGENT: &str = concat!("MobiLauncher/", env!("CARGO_PKG_VERSION"));

/// Shared client. `read_timeout` bounds every stall while reading, not the
/// whole transfer, so large artifacts can stream for as long as they keep moving.
pub fn build_http_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    http_client_builder(connect_timeout, read_timeout).build()
}

fn http_client_builder(connect_timeout: Duration, read_timeout: Duration) -> ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
}

/// Failure of a single remote transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Transport(String),
    #[error("write to {path:?} failed: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for TransferError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransferError::Timeout
        } else if let Some(status) = err.status() {
            TransferError::Status(status.as_u16())
        } else {
            TransferError::Transport(err.to_string())
        }
    }
}

/// Where remote documents and artifacts come from.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// GET a text document.
    async fn fetch_text(&self, url: &str) -> Result<String, TransferError>;

    /// Stream a remote resource into `dest`, returning the number of bytes written.
    /// `dest` is created or truncated; its parent must exist.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError>;
}

/// `RemoteSource` backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    document_timeout: Option<Duration>,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            document_timeout: None,
        }
    }

    /// Total deadline for `fetch_text`. Downloads are only bounded by the
    /// client's read timeout.
    pub fn with_document_timeout(mut self, timeout: Duration) -> Self {
        self.document_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String, TransferError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.document_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }

        let write_err = |source: std::io::Error| TransferError::Write {
            path: dest.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0_u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written = written.saturating_add(chunk.len() as u64);
        }
        file.flush().await.map_err(write_err)?;
        // handle dropped before the caller renames the file (Windows)
        drop(file);

        Ok(written)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory source that records every transfer.
    #[derive(Default)]
    pub struct StaticSource {
        documents: HashMap<String, Vec<u8>>,
        pub downloads: AtomicUsize,
        pub fetches: AtomicUsize,
        pub downloaded_urls: Mutex<Vec<String>>,
    }

    impl StaticSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.documents.insert(url.to_string(), body.into());
            self
        }

        pub fn download_count(&self) -> usize {
            self.downloads.load(Ordering::SeqCst)
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    /// Wraps a `StaticSource`, holding each download for a per-URL delay and
    /// recording completion order and overlap.
    pub struct DelayedSource {
        inner: StaticSource,
        delays: HashMap<String, Duration>,
        default_delay: Duration,
        in_flight: Mutex<HashMap<String, usize>>,
        max_same_url: AtomicUsize,
        completed: Mutex<Vec<String>>,
    }

    impl DelayedSource {
        pub fn new(inner: StaticSource, default_delay: Duration) -> Self {
            Self {
                inner,
                delays: HashMap::new(),
                default_delay,
                in_flight: Mutex::new(HashMap::new()),
                max_same_url: AtomicUsize::new(0),
                completed: Mutex::new(Vec::new()),
            }
        }

        pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        pub fn download_count(&self) -> usize {
            self.inner.download_count()
        }

        /// Highest number of simultaneous downloads seen for any single URL.
        pub fn max_same_url_in_flight(&self) -> usize {
            self.max_same_url.load(Ordering::SeqCst)
        }

        pub fn completed_urls(&self) -> Vec<String> {
            self.completed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteSource for DelayedSource {
        async fn fetch_text(&self, url: &str) -> Result<String, TransferError> {
            self.inner.fetch_text(url).await
        }

        async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
            {
                let mut in_flight = self.in_flight.lock().unwrap();
                let current = in_flight.entry(url.to_string()).or_default();
                *current += 1;
                self.max_same_url.fetch_max(*current, Ordering::SeqCst);
            }

            let delay = self.delays.get(url).copied().unwrap_or(self.default_delay);
            tokio::time::sleep(delay).await;
            let result = self.inner.download(url, dest).await;

            if let Some(current) = self.in_flight.lock().unwrap().get_mut(url) {
                *current -= 1;
            }
            self.completed.lock().unwrap().push(url.to_string());
            result
        }
    }

    #[async_trait]
    impl RemoteSource for StaticSource {
        async fn fetch_text(&self, url: &str) -> Result<String, TransferError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let body = self.documents.get(url).ok_or(TransferError::Status(404))?;
            Ok(String::from_utf8_lossy(body).into_owned())
        }

        async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            self.downloaded_urls.lock().unwrap().push(url.to_string());
            let body = self.documents.get(url).ok_or(TransferError::Status(404))?;
            tokio::fs::write(dest, body)
                .await
                .map_err(|source| TransferError::Write {
                    path: dest.to_path_buf(),
                    source,
                })?;
            Ok(body.len() as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    /// Answers `connections` requests with a 60-byte body sent in six chunks
    /// 100 ms apart.
    async fn trickle_server(connections: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for _ in 0..connections {
                let (mut socket, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    let mut request = [0u8; 2048];
                    let _ = socket.read(&mut request).await;
                    let head = "HTTP/1.1 200 OK\r\nContent-Length: 60\r\nConnection: close\r\n\r\n";
                    if socket.write_all(head.as_bytes()).await.is_err() {
                        return;
                    }
                    for _ in 0..6 {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        if socket.write_all(&[b'x'; 10]).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        format!("http://{}/runtime.zip", addr)
    }

    #[tokio::test]
    async fn steady_download_is_not_cut_by_a_total_deadline() {
        let url = trickle_server(2).await;
        let client = http_client_builder(Duration::from_secs(5), Duration::from_millis(400))
            .no_proxy()
            .build()
            .unwrap();
        let source = HttpSource::new(client).with_document_timeout(Duration::from_millis(300));
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("runtime.zip");

        // ~600 ms in total, but never idle for longer than the read timeout.
        let written = source.download(&url, &dest).await.unwrap();
        assert_eq!(written, 60);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 60);

        // Catalog documents keep a hard deadline.
        assert!(source.fetch_text(&url).await.is_err());
    }
}
