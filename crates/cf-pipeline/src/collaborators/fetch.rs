//! Media fetchers: remote download service, local files, and a router that
//! picks between them by the shape of the source reference.
//!
//! The download service is an unreliable black box, so its timeout and the
//! bounded retry on throttling / server errors live here rather than in the
//! pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cf_core::config::FetcherConfig;
use serde_json::json;
use tokio::io::AsyncWriteExt;

use crate::collaborator::MediaFetcher;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Base name (without extension) of the fetched source inside a workspace.
const SOURCE_STEM: &str = "src";

fn is_remote(source_ref: &str) -> bool {
    let lower = source_ref.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// ---------------------------------------------------------------------------
// HttpMediaFetcher
// ---------------------------------------------------------------------------

/// Asks a download service to resolve a URL and streams the returned media to
/// disk. The service receives `{"url": <source_ref>, "format": <format>}`.
#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    http: reqwest::Client,
    endpoint: String,
    format: String,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl HttpMediaFetcher {
    /// Build a fetcher for `endpoint`, requesting media in `format`.
    pub fn new(
        endpoint: impl Into<String>,
        format: impl Into<String>,
        config: &FetcherConfig,
    ) -> cf_core::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| cf_core::Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            format: format.into(),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    /// Override the base delay between attempts (multiplied by attempt number).
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn request(&self, source_ref: &str) -> cf_core::Result<reqwest::Response> {
        let body = json!({ "url": source_ref, "format": self.format });
        let mut attempt = 1;

        loop {
            let last = attempt >= self.max_attempts;
            match self.http.post(&self.endpoint).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    let retryable =
                        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !retryable || last {
                        return Err(cf_core::Error::FetchFailed(format!(
                            "download service returned {status}"
                        )));
                    }
                    tracing::warn!(
                        "Download service returned {status} (attempt {attempt}/{}); retrying",
                        self.max_attempts
                    );
                }
                Err(e) => {
                    let retryable = e.is_connect() || e.is_timeout();
                    if !retryable || last {
                        return Err(cf_core::Error::FetchFailed(format!(
                            "download request failed: {e}"
                        )));
                    }
                    tracing::warn!(
                        "Download request failed (attempt {attempt}/{}): {e}; retrying",
                        self.max_attempts
                    );
                }
            }

            tokio::time::sleep(self.retry_backoff * attempt).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, source_ref: &str, dest_dir: &Path) -> cf_core::Result<PathBuf> {
        let mut resp = self.request(source_ref).await?;

        let dest = dest_dir.join(format!("{SOURCE_STEM}.{}", self.format));
        let mut file = tokio::fs::File::create(&dest).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| cf_core::Error::FetchFailed(format!("download interrupted: {e}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(cf_core::Error::FetchFailed(
                "download service returned an empty body".into(),
            ));
        }

        tracing::info!("Fetched {written} bytes from download service");
        Ok(dest)
    }
}

// ---------------------------------------------------------------------------
// LocalFileFetcher
// ---------------------------------------------------------------------------

/// Copies a file that already exists on this machine into the workspace.
/// Accepts bare paths and `file://` references.
#[derive(Debug, Clone, Default)]
pub struct LocalFileFetcher;

#[async_trait]
impl MediaFetcher for LocalFileFetcher {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, source_ref: &str, dest_dir: &Path) -> cf_core::Result<PathBuf> {
        let source = Path::new(source_ref.strip_prefix("file://").unwrap_or(source_ref));

        let meta = tokio::fs::metadata(source)
            .await
            .map_err(|_| cf_core::Error::FetchFailed(format!("source not found: {source_ref}")))?;
        if !meta.is_file() {
            return Err(cf_core::Error::FetchFailed(format!(
                "source is not a file: {source_ref}"
            )));
        }

        let dest = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => dest_dir.join(format!("{SOURCE_STEM}.{ext}")),
            None => dest_dir.join(SOURCE_STEM),
        };
        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| cf_core::Error::FetchFailed(format!("failed to copy source: {e}")))?;
        Ok(dest)
    }
}

// ---------------------------------------------------------------------------
// SourceFetcher
// ---------------------------------------------------------------------------

/// Routes `http(s)://` references to the download service and, when allowed,
/// everything else to the local filesystem.
///
/// Local sources stay disabled for the HTTP server so callers cannot read
/// arbitrary files off the host.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    remote: Option<HttpMediaFetcher>,
    local: Option<LocalFileFetcher>,
}

impl SourceFetcher {
    pub fn new(remote: Option<HttpMediaFetcher>, allow_local: bool) -> Self {
        Self {
            remote,
            local: allow_local.then_some(LocalFileFetcher),
        }
    }
}

#[async_trait]
impl MediaFetcher for SourceFetcher {
    fn name(&self) -> &'static str {
        "source"
    }

    async fn fetch(&self, source_ref: &str, dest_dir: &Path) -> cf_core::Result<PathBuf> {
        if is_remote(source_ref) {
            let remote = self.remote.as_ref().ok_or_else(|| {
                cf_core::Error::FetchFailed("no download service is configured".into())
            })?;
            return remote.fetch(source_ref, dest_dir).await;
        }

        match &self.local {
            Some(local) => local.fetch(source_ref, dest_dir).await,
            None => Err(cf_core::Error::FetchFailed(
                "only http(s) sources are accepted".into(),
            )),
        }
    }
}
