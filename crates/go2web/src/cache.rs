//! On-disk response cache
//!
//! One file per URL, named by the hex SHA-256 of the URL string and holding
//! the final body text. Freshness comes from the file's modification time;
//! stale files are not deleted, only overwritten by the next write.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Cache directory used when none is configured
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Default freshness window
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);

/// Cache file name for a URL
pub fn fingerprint(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Time-bounded cache of response bodies keyed by URL
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    max_age: Duration,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Path of the record for `url`, whether or not it exists
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(fingerprint(url))
    }

    /// Stored body for `url` if a fresh record exists
    ///
    /// Missing, stale and unreadable records are all a miss. Never writes.
    pub async fn get(&self, url: &str) -> Option<String> {
        let path = self.path_for(url);
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        let modified = metadata.modified().ok()?;

        // An mtime in the future counts as just written
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.max_age {
            debug!(url, age_ms = age.as_millis() as u64, "Cache record stale");
            return None;
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!(url, error = %e, "Cache record unreadable");
                None
            }
        }
    }

    /// Write `body` as the record for `url`, replacing any previous one
    pub async fn put(&self, url: &str, body: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(url), body).await
    }
}

impl Default for DiskCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR, DEFAULT_MAX_AGE)
    }
}
