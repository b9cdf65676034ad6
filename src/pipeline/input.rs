//! Input resolution: turn a user-supplied path or URL into bytes plus a kind.
//!
//! The core pipeline works on raw bytes and a declared [`InputKind`]. This
//! module is the thin edge that reads a local file or downloads a URL,
//! checks magic bytes, and refuses anything that is neither a PDF nor an
//! image we can decode, so callers get a meaningful error instead of a
//! pdfium or decoder failure deep inside extraction.

use crate::error::ReflowError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// What kind of document the input bytes hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    /// A PDF file; may or may not carry an embedded text layer.
    Pdf,
    /// A standalone raster image (photo or scan), always recognised.
    Image,
}

impl InputKind {
    /// Sniff the kind from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            return Some(InputKind::Pdf);
        }
        image::guess_format(bytes).ok().map(|_| InputKind::Image)
    }
}

/// Input bytes ready for extraction.
#[derive(Debug, Clone)]
pub struct InputDocument {
    pub bytes: Vec<u8>,
    pub kind: InputKind,
    /// File name or URL the bytes came from, for messages.
    pub name: String,
}

impl InputDocument {
    /// Wrap in-memory bytes, trusting `declared` over detection when given.
    pub fn from_bytes(
        bytes: Vec<u8>,
        declared: Option<InputKind>,
        name: impl Into<String>,
    ) -> Result<Self, ReflowError> {
        let name = name.into();
        let kind = match declared.or_else(|| InputKind::detect(&bytes)) {
            Some(kind) => kind,
            None => {
                return Err(ReflowError::UnsupportedInput {
                    name,
                    magic: bytes.iter().take(4).copied().collect(),
                })
            }
        };
        debug!("Input '{}' treated as {:?}", name, kind);
        Ok(Self { bytes, kind, name })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to input bytes.
pub async fn resolve_input(
    input: &str,
    declared: Option<InputKind>,
    timeout_secs: u64,
) -> Result<InputDocument, ReflowError> {
    if input.trim().is_empty() {
        return Err(ReflowError::InvalidInput {
            input: input.to_string(),
        });
    }
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    InputDocument::from_bytes(bytes, declared, input)
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, ReflowError> {
    let path = PathBuf::from(path_str);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ReflowError::PermissionDenied { path })
        }
        Err(_) => Err(ReflowError::FileNotFound { path }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ReflowError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReflowError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReflowError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReflowError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReflowError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReflowError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
