//! Capture sources: image files on disk and camera snapshots.

use std::path::Path;

use crate::error::{AppError, AppResult};

pub mod webcam;

pub use webcam::{CameraConstraints, CameraDevice, StillImageDevice, WebcamCapture};

/// Largest accepted upload (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const NOT_AN_IMAGE_MESSAGE: &str = "Please select an image file";
pub const TOO_LARGE_MESSAGE: &str = "File size must be less than 10MB";

/// A single still image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file, guessing its content type from the extension
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::new(file_name, content_type, bytes))
    }

    /// Pre-flight checks run before any network call
    pub fn validate(&self) -> AppResult<()> {
        if !self.content_type.starts_with("image/") {
            return Err(AppError::Validation(NOT_AN_IMAGE_MESSAGE.to_string()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(TOO_LARGE_MESSAGE.to_string()));
        }
        Ok(())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
