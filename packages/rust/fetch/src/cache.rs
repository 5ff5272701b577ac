//! Content-addressed JSON response cache.
//!
//! Each cached response lives at `<dir>/<sha256(url)>.json`. Reads never
//! look at file age; expiry is the job of [`JsonCache::sweep_expired`],
//! which runs before a build rather than on the read path.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use glossary_shared::{GlossaryError, Result};

/// On-disk cache of JSON responses keyed by request URL.
#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `url`.
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", compute_hash(url)))
    }

    /// Look up a cached response. Unreadable or corrupt entries count as misses.
    pub fn get(&self, url: &str) -> Option<serde_json::Value> {
        let path = self.entry_path(url);
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => {
                debug!(path = %path.display(), "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                None
            }
        }
    }

    /// Store a response for `url`, replacing any previous entry.
    pub fn put(&self, url: &str, value: &serde_json::Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| GlossaryError::io(&self.dir, e))?;

        let target = self.entry_path(url);
        let temp = target.with_extension("json.tmp");
        let body = serde_json::to_string(value)
            .map_err(|e| GlossaryError::Serialization(e.to_string()))?;

        std::fs::write(&temp, body).map_err(|e| GlossaryError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| GlossaryError::io(&target, e))?;

        debug!(path = %target.display(), "cached response");
        Ok(())
    }

    /// Remove every regular file in the cache directory (JSON entries and
    /// downloaded source files alike) last modified more than `ttl` ago.
    ///
    /// Returns the number of files removed. A missing directory is not an error.
    pub fn sweep_expired(&self, ttl: Duration) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let now = SystemTime::now();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| GlossaryError::io(&self.dir, e))?;
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            let Ok(modified) = meta.modified() else { continue };
            let age = now.duration_since(modified).unwrap_or_default();
            if age > ttl {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => debug!(path = %path.display(), error = %e, "could not remove expired entry"),
                }
            }
        }

        if removed > 0 {
            info!(removed, dir = %self.dir.display(), "cleaned old cache files");
        }
        Ok(removed)
    }
}

/// Compute SHA-256 hash of content as lowercase hex.
pub(crate) fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
