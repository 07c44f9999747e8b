//! Durable storage for transient media (inline `data:` URIs) referenced by
//! carousel cards and media payloads.

use std::path::PathBuf;

mod data_uri;
mod fs_store;

pub use data_uri::{InlineMedia, extension_for, parse_data_uri};
pub use fs_store::{FsMediaStore, content_hash};

const MEDIA_DIR_ENV: &str = "BCAST_MEDIA_DIR";
const MEDIA_BASE_URL_ENV: &str = "BCAST_MEDIA_BASE_URL";
const DEFAULT_MEDIA_DIR: &str = "./media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    pub dir: PathBuf,
    pub base_url: Option<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            base_url: None,
        }
    }
}

impl MediaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(dir) = lookup(MEDIA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            cfg.dir = PathBuf::from(dir.trim());
        }
        cfg.base_url = lookup(MEDIA_BASE_URL_ENV).filter(|v| !v.trim().is_empty());
        cfg
    }

    pub fn build(&self) -> FsMediaStore {
        FsMediaStore::new(self.dir.clone(), self.base_url.clone())
    }
}
