//! Rate-limited, retrying HTTP fetcher.
//!
//! Every attempt (including the first) waits `request_delay_ms`. A failed
//! attempt `n` waits `n * retry_backoff_ms` before the next one, multiplied
//! by `rate_limit_multiplier` when the server answered 429. Execution is
//! strictly sequential: callers await each request before issuing the next.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Response, header};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use glossary_shared::{FetchConfig, GlossaryError, Result};

use crate::cache::JsonCache;

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// HTTP client with pacing, retry/backoff and a JSON response cache.
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
    cache: JsonCache,
}

impl Fetcher {
    /// Create a fetcher whose JSON cache lives in `config.cache_dir`.
    ///
    /// `timeout_secs` bounds connecting and each individual read, not the
    /// whole transfer, so a slow body that keeps arriving is never cut off.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .read_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GlossaryError::Network(format!("failed to build HTTP client: {e}")))?;

        let cache = JsonCache::new(config.cache_dir.clone());

        Ok(Self {
            config,
            client,
            cache,
        })
    }

    /// The JSON response cache.
    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }

    /// Fetch and parse a JSON document, consulting the cache first.
    ///
    /// A cache hit returns without touching the network. On success the
    /// response is written to the cache. Exhausted retries propagate the
    /// last error.
    #[instrument(skip_all, fields(url = %truncate_url(url)))]
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        if let Some(cached) = self.cache.get(url) {
            return Ok(cached);
        }

        let value = self
            .with_retry(url, || self.get_json_once(url))
            .await?;

        if let Err(e) = self.cache.put(url, &value) {
            warn!(error = %e, "failed to cache response");
        }
        Ok(value)
    }

    /// Download `url` to `dest` unless `dest` already exists.
    ///
    /// The body is streamed into a temp file next to `dest` and renamed into
    /// place, so an interrupted transfer never leaves a file that would
    /// satisfy the existence check. Exhausted retries propagate the last error.
    #[instrument(skip_all, fields(url = %url, dest = %dest.display()))]
    pub async fn download_file(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        if dest.exists() {
            debug!("destination exists, skipping download");
            return Ok(dest.to_path_buf());
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GlossaryError::io(parent, e))?;
        }

        self.with_retry(url, || self.download_once(url, dest)).await?;
        info!("download complete");
        Ok(dest.to_path_buf())
    }

    /// Fetch a raw body of at most `max_bytes`.
    ///
    /// Never fails: an oversized body (declared or streamed) returns empty
    /// immediately, and exhausted retries degrade to empty as well.
    #[instrument(skip_all, fields(url = %url, max_bytes = max_bytes))]
    pub async fn fetch_bytes(&self, url: &str, accept: &str, max_bytes: u64) -> Vec<u8> {
        match self
            .with_retry(url, || self.get_bytes_once(url, accept, max_bytes))
            .await
        {
            Ok(Some(body)) => body,
            Ok(None) => {
                warn!("response exceeds byte budget, skipping");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "giving up on optional resource");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Retry machinery
    // -----------------------------------------------------------------------

    /// Run `attempt` until it succeeds or `retry_limit` attempts have failed.
    async fn with_retry<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt_no: u32 = 0;
        loop {
            attempt_no += 1;
            self.pace().await;

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt_no >= self.config.retry_limit => {
                    warn!(url = %truncate_url(url), attempts = attempt_no, error = %e, "retries exhausted");
                    return Err(e);
                }
                Err(e) => {
                    let wait = self.backoff(attempt_no, e.is_rate_limited());
                    debug!(
                        url = %truncate_url(url),
                        attempt = attempt_no,
                        rate_limited = e.is_rate_limited(),
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "request failed, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Fixed pre-request delay.
    async fn pace(&self) {
        if self.config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }
    }

    /// Linear backoff after failed attempt `attempt`, amplified for 429s.
    fn backoff(&self, attempt: u32, rate_limited: bool) -> Duration {
        let mut ms = self.config.retry_backoff_ms.saturating_mul(u64::from(attempt));
        if rate_limited {
            ms = ms.saturating_mul(u64::from(self.config.rate_limit_multiplier));
        }
        Duration::from_millis(ms)
    }

    // -----------------------------------------------------------------------
    // Single attempts
    // -----------------------------------------------------------------------

    async fn send(&self, url: &str, accept: Option<&str>) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(header::ACCEPT, accept);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GlossaryError::Network(format!("{}: {e}", truncate_url(url))))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GlossaryError::Http {
                url: truncate_url(url).to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json_once(&self, url: &str) -> Result<serde_json::Value> {
        let response = self.send(url, Some("application/json")).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| GlossaryError::Network(format!("body read failed: {e}")))?;
        serde_json::from_slice(&body).map_err(|e| GlossaryError::parse(format!("invalid JSON: {e}")))
    }

    async fn download_once(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.send(url, None).await?;

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".into());
        let temp = dest.with_file_name(format!(".{file_name}.tmp"));

        let result = async {
            let mut file = tokio::fs::File::create(&temp)
                .await
                .map_err(|e| GlossaryError::io(&temp, e))?;
            let mut written: u64 = 0;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| GlossaryError::Network(format!("body read failed: {e}")))?
            {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| GlossaryError::io(&temp, e))?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(|e| GlossaryError::io(&temp, e))?;
            debug!(bytes = written, "body streamed to temp file");
            Ok::<_, GlossaryError>(())
        }
        .await;

        match result {
            Ok(()) => {
                std::fs::rename(&temp, dest).map_err(|e| GlossaryError::io(dest, e))?;
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(&temp);
                Err(e)
            }
        }
    }

    /// `Ok(None)` means the body is over budget; that outcome is final and not retried.
    async fn get_bytes_once(
        &self,
        url: &str,
        accept: &str,
        max_bytes: u64,
    ) -> Result<Option<Vec<u8>>> {
        let mut response = self.send(url, Some(accept)).await?;

        if let Some(len) = response.content_length() {
            if len > max_bytes {
                debug!(declared = len, "declared length over budget");
                return Ok(None);
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GlossaryError::Network(format!("body read failed: {e}")))?
        {
            if (body.len() + chunk.len()) as u64 > max_bytes {
                debug!(streamed = body.len() + chunk.len(), "streamed size over budget");
                return Ok(None);
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Some(body))
    }
}

/// Shorten long query URLs for logs.
fn truncate_url(url: &str) -> &str {
    const MAX: usize = 120;
    if url.len() <= MAX {
        return url;
    }
    let mut end = MAX;
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    &url[..end]
}
