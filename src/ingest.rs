//! Ingestion pipeline orchestration.
//!
//! Turns raw inputs into stored text: uploads are validated (extension
//! allow-list, size cap), written under a fresh UUID name so the
//! caller-visible filename never touches the filesystem, then run through
//! the extractor; portfolio links go straight to the URL extractor.
//! Also carries the upload-directory housekeeping (stats, age-based
//! cleanup).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::extract::{self, stored_text};
use crate::webpage;

/// Extensions accepted for upload, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx", "jpg", "jpeg", "png", "gif"];

/// Upload rejection, surfaced before any side effect.
#[derive(Debug)]
pub enum UploadError {
    /// Extension outside the allow-list (or missing).
    NotAllowed(String),
    /// Byte length over the configured maximum.
    TooLarge { size: u64, limit: u64 },
    /// Artifact write failure.
    Io(String),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::NotAllowed(name) => write!(f, "File type not allowed: {}", name),
            UploadError::TooLarge { size, limit } => {
                write!(f, "File too large: {} bytes (limit {} bytes)", size, limit)
            }
            UploadError::Io(e) => write!(f, "Failed to save upload: {}", e),
        }
    }
}

impl std::error::Error for UploadError {}

impl UploadError {
    /// Whether the failure is a caller mistake (4xx) rather than ours.
    pub fn is_validation(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether a filename passes the upload allow-list.
pub fn is_allowed_file(filename: &str) -> bool {
    match extension_of(filename) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Validate and persist an uploaded artifact.
///
/// Returns the on-disk path of the stored binary. The storage name is a
/// fresh UUID preserving the original extension, so hostile or colliding
/// display names never reach the filesystem.
pub fn save_upload(
    storage: &StorageConfig,
    original_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, UploadError> {
    if !is_allowed_file(original_name) {
        return Err(UploadError::NotAllowed(original_name.to_string()));
    }

    let size = bytes.len() as u64;
    if size > storage.max_upload_bytes {
        return Err(UploadError::TooLarge {
            size,
            limit: storage.max_upload_bytes,
        });
    }

    // is_allowed_file guarantees the extension exists past this point.
    let ext = extension_of(original_name).unwrap_or_default();
    let storage_name = format!("{}.{}", Uuid::new_v4(), ext);

    std::fs::create_dir_all(&storage.upload_dir).map_err(|e| UploadError::Io(e.to_string()))?;
    let path = storage.upload_dir.join(storage_name);
    std::fs::write(&path, bytes).map_err(|e| UploadError::Io(e.to_string()))?;

    Ok(path)
}

/// Extract text from a stored artifact. Always yields text, never fails.
pub fn process_file(path: &Path) -> String {
    stored_text(extract::extract_file(path))
}

/// Extract text from a portfolio URL. Always yields text, never fails.
pub async fn ingest_link(url: &str) -> String {
    stored_text(webpage::fetch_url(url).await)
}

/// Counts and sizes of everything in the upload directory.
#[derive(Debug, Serialize)]
pub struct UploadStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
}

pub fn upload_stats(storage: &StorageConfig) -> Result<UploadStats> {
    let mut total_files = 0usize;
    let mut total_size_bytes = 0u64;

    if storage.upload_dir.exists() {
        let entries = std::fs::read_dir(&storage.upload_dir)
            .with_context(|| format!("Failed to read {}", storage.upload_dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                total_files += 1;
                total_size_bytes += entry.metadata()?.len();
            }
        }
    }

    let total_size_mb = (total_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
    Ok(UploadStats {
        total_files,
        total_size_bytes,
        total_size_mb,
    })
}

/// Delete stored artifacts older than `days_old` days. Returns the count
/// of removed files.
pub fn cleanup_old_uploads(storage: &StorageConfig, days_old: u64) -> Result<usize> {
    let mut removed = 0usize;

    if !storage.upload_dir.exists() {
        return Ok(0);
    }

    let cutoff = std::time::SystemTime::now()
        .checked_sub(std::time::Duration::from_secs(days_old * 24 * 60 * 60));
    let Some(cutoff) = cutoff else {
        return Ok(0);
    };

    let entries = std::fs::read_dir(&storage.upload_dir)
        .with_context(|| format!("Failed to read {}", storage.upload_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}
