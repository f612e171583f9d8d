use std::time::Duration;

use crate::models::{UploadProgress, UploadStatus};

/// Progress shown as soon as a run enters `uploading`
pub const UPLOAD_START_PROGRESS: u8 = 20;
/// Increment applied on each upload tick
pub const UPLOAD_STEP: u8 = 15;
/// Upload progress never passes this until the run is analyzing
pub const UPLOAD_PROGRESS_CAP: u8 = 60;
pub const UPLOAD_TICK: Duration = Duration::from_millis(300);
/// Elapsed upload time after which the run switches to `analyzing`
pub const ANALYZING_AFTER: Duration = Duration::from_millis(1500);
pub const ANALYZING_PROGRESS: u8 = 70;

/// Rejected state-machine transition
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: UploadStatus,
    pub to: UploadStatus,
}

/// Upload/analysis state machine for one session
///
/// `idle → uploading → analyzing → complete | error`. Terminal states are
/// left only through [`UploadTracker::begin`], which resets and starts a new
/// run.
#[derive(Debug, Clone, Default)]
pub struct UploadTracker {
    current: UploadProgress,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &UploadProgress {
        &self.current
    }

    pub fn status(&self) -> UploadStatus {
        self.current.status
    }

    pub fn is_busy(&self) -> bool {
        self.current.status.is_busy()
    }

    /// Starts a run: resets a terminal state to `idle`, then enters `uploading`
    pub fn begin(&mut self) -> Result<(), InvalidTransition> {
        if self.is_busy() {
            return Err(self.invalid(UploadStatus::Uploading));
        }
        self.reset();
        self.current = UploadProgress::new(UPLOAD_START_PROGRESS, UploadStatus::Uploading);
        Ok(())
    }

    /// Upload tick; a no-op outside `uploading`
    pub fn advance(&mut self) {
        if self.current.status == UploadStatus::Uploading {
            self.current.progress = self
                .current
                .progress
                .saturating_add(UPLOAD_STEP)
                .min(UPLOAD_PROGRESS_CAP);
        }
    }

    pub fn start_analyzing(&mut self) -> Result<(), InvalidTransition> {
        if self.current.status != UploadStatus::Uploading {
            return Err(self.invalid(UploadStatus::Analyzing));
        }
        self.current = UploadProgress::new(ANALYZING_PROGRESS, UploadStatus::Analyzing);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), InvalidTransition> {
        if !self.is_busy() {
            return Err(self.invalid(UploadStatus::Complete));
        }
        self.current = UploadProgress::new(100, UploadStatus::Complete);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        if !self.is_busy() {
            return Err(self.invalid(UploadStatus::Error));
        }
        self.current = UploadProgress {
            progress: 0,
            status: UploadStatus::Error,
            message: Some(message.into()),
        };
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current = UploadProgress::default();
    }

    fn invalid(&self, to: UploadStatus) -> InvalidTransition {
        InvalidTransition {
            from: self.current.status,
            to,
        }
    }
}
