//! On-disk cache for remote thumbnails, keyed by the MD5 of the image URL.
//!
//! Browsers on the LAN load every thumbnail through `/img?url=...`, so each
//! image is fetched from the internet once and then served from disk.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context};
use reqwest::{Client, Url};
use tracing::{debug, warn};

/// Header value sent with every cached image.
pub const CACHE_CONTROL: &str = "public, max-age=86400";

/// Suffix counter for temp files, unique per write within this process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct ImageCache {
    dir: PathBuf,
    client: Client,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>, client: Client) -> Self {
        Self {
            dir: dir.into(),
            client,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for `url`: lowercase hex MD5.
    pub fn key(url: &str) -> String {
        format!("{:x}", md5::compute(url.as_bytes()))
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(Self::key(url))
    }

    /// Only absolute http(s) URLs are fetched.
    pub fn is_fetchable(url: &str) -> bool {
        Url::parse(url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    /// Cached bytes for `url`, fetching and storing them on a miss.
    pub async fn get(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        if !Self::is_fetchable(url) {
            bail!("not an http(s) url: {}", url);
        }

        let path = self.path_for(url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("image cache hit: {}", url);
                return Ok(bytes);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("image cache: unreadable {:?}: {}", path, e),
        }

        debug!("image cache miss: {}", url);
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching {}", url))?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec();

        if let Err(e) = self.store(&path, &bytes).await {
            // Still serve the image; the next request retries the write.
            warn!("image cache: could not store {:?}: {:#}", path, e);
        }
        Ok(bytes)
    }

    /// Write to a temp file beside the target, then rename, so readers never
    /// see a partial image.
    async fn store(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {:?}", self.dir))?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {:?}", tmp))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("renaming into {:?}", path));
        }
        Ok(())
    }
}

/// Content type from the leading magic bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
