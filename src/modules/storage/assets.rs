use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use crate::api::error;

/// Local directory of thumbnail files served under `/assets`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    base_url: String,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { root: root.into(), base_url }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<32 random bytes, url-safe base64>.<subtype>`, e.g. `Zk3...q.png`.
    pub fn random_filename(media_type: &str) -> String {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let ext = media_type.split_once('/').map(|(_, sub)| sub).unwrap_or("bin");
        format!("{}.{}", URL_SAFE_NO_PAD.encode(raw), ext)
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/assets/{}", self.base_url, filename)
    }

    /// Writes `bytes` under a fresh name and returns its public URL.
    pub async fn save(&self, media_type: &str, bytes: &[u8]) -> Result<String, error::SystemError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let filename = Self::random_filename(media_type);
        tokio::fs::write(self.root.join(&filename), bytes).await?;

        log::info!("Stored asset {filename} ({} bytes)", bytes.len());
        Ok(self.url_for(&filename))
    }

    /// Maps a request path segment onto the assets directory, refusing anything
    /// that could escape it.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let valid = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(&['/', '\\'][..])
            && !filename.contains("..");
        valid.then(|| self.root.join(filename))
    }
}
