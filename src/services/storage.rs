//! Image file storage.
//!
//! Uploaded images are written once under a content-hash name and served
//! back as static files; the public URL recorded in each `images` row is
//! derived from the request's own scheme and host plus the upload prefix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot build public URL: {0}")]
    Url(#[from] url::ParseError),
}

/// One buffered multipart file part
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where a stored file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// File name under the storage root, also the URL's last segment
    pub key: String,
    pub path: PathBuf,
}

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn store(&self, upload: &Upload) -> Result<StoredImage, StorageError>;

    /// Directory static file serving reads from
    fn root(&self) -> &Path;
}

/// Files on the local disk under a single directory
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn store(&self, upload: &Upload) -> Result<StoredImage, StorageError> {
        let ext = extension_for(&upload.content_type)
            .ok_or_else(|| StorageError::UnsupportedType(upload.content_type.clone()))?;

        // Same bytes map to the same name, so re-uploads overwrite in place
        let digest = Sha256::digest(&upload.bytes);
        let key = format!("{:x}.{}", digest, ext);
        let path = self.root.join(&key);

        self.ensure_root().await?;
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|source| StorageError::Io { path: path.clone(), source })?;

        tracing::debug!("Stored {} bytes as {}", upload.bytes.len(), key);
        Ok(StoredImage { key, path })
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// `scheme://host` the client used, honouring reverse-proxy headers
pub fn request_base_url(headers: &HeaderMap) -> Result<Url, StorageError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let scheme = header("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or_else(|| "localhost".to_string());

    Ok(Url::parse(&format!("{}://{}", scheme, host))?)
}

/// Absolute URL of a stored file under `prefix` (e.g. `/uploads`)
pub fn public_url(base: &Url, prefix: &str, key: &str) -> Result<String, StorageError> {
    let path = format!("{}/{}", prefix.trim_end_matches('/'), key);
    Ok(base.join(&path)?.to_string())
}
