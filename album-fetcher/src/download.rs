//! 单张图片下载
//!
//! Each image is rebuilt from its content hash at the `large` tier first and
//! the `medium` tier second. Every tier gets [`IMAGE_RETRIES`] attempts with
//! a linearly growing pause. Writes go to a tmp file and are renamed into
//! place so an interrupted run never leaves a truncated image behind.

use std::path::Path;

use shared::layout;

use crate::client::PageSource;
use crate::config::{Delays, IMAGE_RETRIES, IMAGE_TIERS};
use crate::parse::ImageRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    /// Already on disk, under its own or its `.jpg`/`.jpeg` twin name
    AlreadyPresent,
    Failed,
}

/// Whether `dir` already holds this image
pub fn already_present(dir: &Path, file_name: &str) -> bool {
    if dir.join(file_name).exists() {
        return true;
    }
    layout::extension_twin(file_name).is_some_and(|twin| dir.join(twin).exists())
}

async fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
    let final_path = dir.join(file_name);
    let tmp_path = dir.join(format!("{file_name}.tmp"));
    tokio::fs::write(&tmp_path, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}

/// Download one image into `dir` (which must exist)
pub async fn download_image(
    source: &dyn PageSource,
    image: &ImageRef,
    dir: &Path,
    delays: &Delays,
) -> DownloadOutcome {
    let file_name = image.file_name();
    if already_present(dir, &file_name) {
        return DownloadOutcome::AlreadyPresent;
    }

    for tier in IMAGE_TIERS {
        let url = image.tier_url(tier);
        for attempt in 0..IMAGE_RETRIES {
            match source.image(&url).await {
                Ok(bytes) => match write_atomic(dir, &file_name, &bytes).await {
                    Ok(()) => {
                        tracing::debug!(file = %file_name, tier, size = bytes.len(), "Image saved");
                        return DownloadOutcome::Downloaded;
                    }
                    Err(e) => {
                        tracing::warn!(file = %file_name, error = %e, "Failed to write image");
                        return DownloadOutcome::Failed;
                    }
                },
                Err(e) => {
                    tracing::debug!(url = %url, attempt = attempt + 1, error = %e, "Image request failed");
                    if attempt + 1 < IMAGE_RETRIES {
                        tokio::time::sleep(delays.retry_unit * (attempt + 1)).await;
                    }
                }
            }
        }
        tracing::info!(hash = %image.hash, tier, "Tier exhausted, trying next resolution");
    }

    tracing::warn!(hash = %image.hash, "Image could not be downloaded at any resolution");
    DownloadOutcome::Failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twin_counts_as_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.jpg"), b"x").unwrap();
        assert!(already_present(dir.path(), "abc.jpg"));
        assert!(already_present(dir.path(), "abc.jpeg"));
        assert!(!already_present(dir.path(), "abc.png"));
        assert!(!already_present(dir.path(), "def.jpeg"));
    }
}
