// Media store - verifies uploaded images and writes them under the media root
//
// Stored paths are relative (`posts/<file name>`) so the same value works as
// a database column and as a URL below `/media/`.

use once_cell::sync::Lazy;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::framework::forms::UploadedFile;

/// Directory below the media root that holds post images
pub const POST_IMAGE_DIR: &str = "posts";

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("file name pattern"));

/// Decode check for untrusted bytes (blocking version)
pub fn is_decodable_image(data: &[u8]) -> bool {
    match image::load_from_memory(data) {
        Ok(img) => {
            debug!(width = img.width(), height = img.height(), "Decoded uploaded image");
            true
        }
        Err(e) => {
            debug!("Rejected upload: {}", e);
            false
        }
    }
}

/// Decode check on the blocking thread pool
pub async fn verify_image(data: Vec<u8>) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || is_decodable_image(&data))
        .await
        .map_err(|e| AppError::Internal(format!("Image verification task panicked: {}", e)))
}

/// Reduce a client-supplied name to a safe, flat file name
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let cleaned = UNSAFE_FILE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(file_name: &str, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", file_name, suffix),
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a verified post image; returns its relative path. Existing files
    /// are never overwritten: a clashing name gets a random suffix.
    pub async fn save_post_image(&self, upload: &UploadedFile) -> AppResult<String> {
        let dir = self.root.join(POST_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::MediaError(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let base = sanitize_file_name(&upload.file_name);
        let mut file_name = base.clone();
        loop {
            let target = dir.join(&file_name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
            {
                Ok(mut file) => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(&upload.data).await.map_err(|e| {
                        AppError::MediaError(format!("Failed to write {}: {}", target.display(), e))
                    })?;
                    file.flush().await.map_err(|e| {
                        AppError::MediaError(format!("Failed to flush {}: {}", target.display(), e))
                    })?;
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    file_name = with_suffix(&base, &random_suffix());
                }
                Err(e) => {
                    return Err(AppError::MediaError(format!(
                        "Failed to create {}: {}",
                        target.display(),
                        e
                    )));
                }
            }
        }

        let relative = format!("{}/{}", POST_IMAGE_DIR, file_name);
        info!("Stored post image {}", relative);
        Ok(relative)
    }
}
