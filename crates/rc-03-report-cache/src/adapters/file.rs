//! File-per-key TTL cache.
//!
//! Each key maps to `<dir>/<sha256(key)>`. File content:
//!
//! ```text
//! <expiry unix nanos>\n<value bytes>
//! ```
//!
//! Expired or malformed files read as absent. Expired files are removed on
//! read and by `purge_expired`. Writes go to a uniquely named temp file in
//! the same directory and are renamed into place.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use shared_crypto::sha256_hex;
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::ports::ReportCache;

/// Cache stored as individual files in one directory.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    closed: AtomicBool,
}

impl FileCache {
    /// Use `dir` as the cache directory, creating it if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(dir = %dir.display(), "Opened file cache");
        Ok(Self {
            dir,
            closed: AtomicBool::new(false),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(sha256_hex(key.as_bytes()))
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Split file content into (expiry, value). `None` if malformed.
fn parse_entry(bytes: &[u8]) -> Option<(u128, &[u8])> {
    let newline = bytes.iter().position(|b| *b == b'\n')?;
    let expiry = std::str::from_utf8(&bytes[..newline]).ok()?.parse().ok()?;
    Some((expiry, &bytes[newline + 1..]))
}

/// Entry files are named by a SHA-256 hex digest; anything else in the
/// directory (temp files included) is not an entry.
fn is_entry_name(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

fn write_entry(dir: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<(), CacheError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ReportCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.ensure_open()?;
        let path = self.path_for(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match parse_entry(&bytes) {
            Some((expiry, value)) if expiry > now_nanos() => Ok(Some(value.to_vec())),
            Some(_) => {
                remove_if_present(&path).await?;
                Ok(None)
            }
            None => {
                tracing::warn!(path = %path.display(), "Ignoring malformed cache file");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.ensure_open()?;
        let path = self.path_for(key);

        let expiry = now_nanos().saturating_add(ttl.as_nanos());
        let mut content = format!("{}\n", expiry).into_bytes();
        content.extend_from_slice(value);

        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || write_entry(&dir, &path, &content))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))??;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ensure_open()?;
        remove_if_present(&self.path_for(key)).await
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        self.ensure_open()?;
        let now = now_nanos();
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if !name.to_str().is_some_and(is_entry_name) {
                continue;
            }
            let path = entry.path();
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            // A set racing this removal loses its marker; a miss is never
            // authoritative.
            if matches!(parse_entry(&bytes), Some((expiry, _)) if expiry <= now) {
                remove_if_present(&path).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(dir = %self.dir.display(), removed, "Purged expired cache files");
        }
        Ok(removed)
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
