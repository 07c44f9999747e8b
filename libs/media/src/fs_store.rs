use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bcast_core::{DurableStore, StoreError, is_durable_ref, is_inline_ref};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::data_uri::parse_data_uri;

/// Content-addressed media store on the local filesystem.
///
/// Files are named `<sha256>.<ext>` under `root`, so storing the same bytes
/// twice yields the same URL.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    base_url: String,
}

impl FsMediaStore {
    /// `base_url` defaults to a `file://` URL of the absolute `root`.
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        let root = root.into();
        let base_url = match base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => file_url(&root),
        };
        Self { root, base_url }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Writes `bytes` (if not already present) and returns the public URL.
    pub async fn store_bytes(&self, bytes: &[u8], extension: &str) -> Result<String, StoreError> {
        let name = format!("{}.{extension}", content_hash(bytes));
        let path = self.root.join(&name);
        if tokio::fs::try_exists(&path).await? {
            debug!(file = %name, "media already stored");
        } else {
            tokio::fs::create_dir_all(&self.root).await?;
            tokio::fs::write(&path, bytes).await?;
            debug!(file = %name, size = bytes.len(), "media stored");
        }
        Ok(format!("{}/{name}", self.base_url))
    }
}

fn file_url(root: &Path) -> String {
    let absolute = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    format!("file://{}", absolute.display())
        .trim_end_matches('/')
        .to_string()
}

#[async_trait]
impl DurableStore for FsMediaStore {
    async fn materialize(&self, reference: &str) -> Result<String, StoreError> {
        if is_durable_ref(reference) {
            return Ok(reference.trim().to_string());
        }
        if !is_inline_ref(reference) {
            return Err(StoreError::Unsupported(reference.chars().take(32).collect()));
        }
        let media = parse_data_uri(reference)?;
        self.store_bytes(&media.bytes, media.extension()).await
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b"hi"),
            "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4"
        );
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let store = FsMediaStore::new("/srv/media", Some("https://cdn.example.com/m/".into()));
        assert_eq!(store.base_url(), "https://cdn.example.com/m");
        let local = FsMediaStore::new("/srv/media", None);
        assert_eq!(local.base_url(), "file:///srv/media");
    }

    #[test]
    fn relative_root_becomes_an_absolute_file_url() {
        let store = FsMediaStore::new("./media", None);
        let url = store.base_url();
        assert!(url.starts_with("file:///"), "{url}");
        assert!(url.ends_with("/media"), "{url}");
        assert!(!url.contains("/./"), "{url}");
    }
}
