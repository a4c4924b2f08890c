//! The generation request as persisted with its task, and the on-disk
//! spool holding uploaded photos until the pipeline has stored them.
//!
//! Photos are written to `{spool}/{video_id}/g{group}_{image}.{ext}` by the
//! API before admission and removed when the run ends.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reel_core::property::{PhotoGroupMode, PropertyDetails};
use reel_core::types::{DbId, VideoId};

/// Task payload: everything a dispatcher needs to run the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    pub owner_id: DbId,
    pub property: PropertyDetails,
    pub groups: Vec<PhotoGroup>,
}

impl GenerationPayload {
    /// `(mode, image count)` per group, as validation expects.
    pub fn group_shapes(&self) -> Vec<(PhotoGroupMode, usize)> {
        self.groups.iter().map(|g| (g.mode, g.images.len())).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoGroup {
    pub mode: PhotoGroupMode,
    pub images: Vec<SpooledImage>,
}

/// A photo waiting in the spool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpooledImage {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
}

/// Directory of per-job photo folders.
#[derive(Debug, Clone)]
pub struct UploadSpool {
    root: PathBuf,
}

impl UploadSpool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_dir(&self, video_id: VideoId) -> PathBuf {
        self.root.join(video_id.to_string())
    }

    /// Spool path for image `image` of group `group`.
    pub fn image_path(&self, video_id: VideoId, group: usize, image: usize, extension: &str) -> PathBuf {
        self.job_dir(video_id)
            .join(format!("g{group}_{image}.{}", sanitize_extension(extension)))
    }

    /// Claim the job's folder for one submission. Fails with
    /// `ErrorKind::AlreadyExists` while another submission holds it.
    pub async fn reserve(&self, video_id: VideoId) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::create_dir(self.job_dir(video_id)).await
    }

    /// Write one photo and describe it for the payload.
    pub async fn store(
        &self,
        video_id: VideoId,
        group: usize,
        image: usize,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> std::io::Result<SpooledImage> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let path = self.image_path(video_id, group, image, extension);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(SpooledImage {
            path,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        })
    }

    pub async fn read(&self, image: &SpooledImage) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&image.path).await
    }

    /// Delete a job's photos. A missing folder is not an error.
    pub async fn remove_job(&self, video_id: VideoId) {
        let dir = self.job_dir(video_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(%video_id, "Spool cleaned up"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(%video_id, error = %e, "Failed to clean up spool"),
        }
    }
}

fn sanitize_extension(extension: &str) -> String {
    let clean: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(5)
        .collect::<String>()
        .to_ascii_lowercase();
    if clean.is_empty() {
        "jpg".into()
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_paths_follow_layout() {
        let spool = UploadSpool::new("/tmp/spool");
        let id = VideoId::nil();
        let path = spool.image_path(id, 2, 1, "JPEG");
        assert_eq!(
            path,
            PathBuf::from(format!("/tmp/spool/{id}/g2_1.jpeg"))
        );
    }

    #[test]
    fn hostile_extensions_are_cleaned() {
        assert_eq!(sanitize_extension("../../x"), "x");
        assert_eq!(sanitize_extension(""), "jpg");
    }

    #[tokio::test]
    async fn reservation_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let spool = UploadSpool::new(dir.path().join("nested"));
        let id = VideoId::new_v4();

        spool.reserve(id).await.unwrap();
        let err = spool.reserve(id).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);

        spool.remove_job(id).await;
        spool.reserve(id).await.unwrap();
    }

    #[tokio::test]
    async fn store_read_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let spool = UploadSpool::new(dir.path());
        let id = VideoId::new_v4();

        let image = spool
            .store(id, 0, 0, "kitchen.png", "image/png", b"png-bytes")
            .await
            .unwrap();
        assert!(image.path.ends_with("g0_0.png"));
        assert_eq!(spool.read(&image).await.unwrap(), b"png-bytes");

        spool.remove_job(id).await;
        assert!(!spool.job_dir(id).exists());
        // Second removal is a no-op.
        spool.remove_job(id).await;
    }
}
