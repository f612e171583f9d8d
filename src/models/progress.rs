use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Stage of the upload/analysis state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Complete,
    Error,
}

impl UploadStatus {
    /// A run is in flight; capture controls are disabled
    pub fn is_busy(self) -> bool {
        matches!(self, UploadStatus::Uploading | UploadStatus::Analyzing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Complete | UploadStatus::Error)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Analyzing => "analyzing",
            UploadStatus::Complete => "complete",
            UploadStatus::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// Snapshot published to progress observers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Percentage in `0..=100`
    pub progress: u8,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadProgress {
    pub fn new(progress: u8, status: UploadStatus) -> Self {
        Self {
            progress: progress.min(100),
            status,
            message: None,
        }
    }

    /// Status line shown next to the progress bar
    pub fn status_line(&self) -> String {
        match self.status {
            UploadStatus::Idle => self.message.clone().unwrap_or_default(),
            UploadStatus::Uploading => "Uploading image...".to_string(),
            UploadStatus::Analyzing => "Analyzing your photo...".to_string(),
            UploadStatus::Complete => "Analysis complete!".to_string(),
            UploadStatus::Error => self
                .message
                .clone()
                .unwrap_or_else(|| "An error occurred".to_string()),
        }
    }
}
