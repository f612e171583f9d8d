use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::Instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, RecommendationResponse, RunId, UploadProgress, UserAnalysis},
    services::{
        backend::RecommendationBackend,
        capture::ImagePayload,
        tracker::{UploadTracker, ANALYZING_AFTER, UPLOAD_TICK},
    },
    session::{BackendStatus, SessionContext},
};

/// Why a submission did not start a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A run is already uploading or analyzing
    Busy,
    /// Backend not confirmed healthy; capture controls are not offered
    BackendUnavailable,
}

/// Result of handing a capture to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Completed(RecommendationResponse),
    Ignored(IgnoreReason),
}

pub const CANCELLED_MESSAGE: &str = "Recommendation request was cancelled";

#[derive(Default)]
struct PipelineState {
    tracker: UploadTracker,
    analysis: Option<UserAnalysis>,
    recommendations: Vec<Movie>,
    error: Option<String>,
}

impl PipelineState {
    fn clear_results(&mut self) {
        self.analysis = None;
        self.recommendations.clear();
        self.error = None;
    }
}

/// Moves an abandoned run to `error` so the session accepts new captures
struct RunGuard<'a> {
    pipeline: &'a RecommendationPipeline,
    settled: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut state = self.pipeline.lock();
        if !state.tracker.is_busy() {
            return;
        }
        state.clear_results();
        if let Err(e) = state.tracker.fail(CANCELLED_MESSAGE) {
            tracing::debug!(error = %e, "Cancelled run already settled");
        }
        state.error = Some(CANCELLED_MESSAGE.to_string());
        self.pipeline.publish(&state);
        tracing::warn!("Run dropped before the backend answered");
    }
}

/// Capture → upload → analysis → normalized result, one run at a time
///
/// Cloning yields another handle to the same session state.
#[derive(Clone)]
pub struct RecommendationPipeline {
    backend: Arc<dyn RecommendationBackend>,
    state: Arc<Mutex<PipelineState>>,
    progress_tx: Arc<watch::Sender<UploadProgress>>,
}

impl RecommendationPipeline {
    pub fn new(backend: Arc<dyn RecommendationBackend>) -> Self {
        let (progress_tx, _) = watch::channel(UploadProgress::default());
        Self {
            backend,
            state: Arc::new(Mutex::new(PipelineState::default())),
            progress_tx: Arc::new(progress_tx),
        }
    }

    /// Progress updates for a presenter
    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress_tx.subscribe()
    }

    pub fn progress(&self) -> UploadProgress {
        self.lock().tracker.snapshot().clone()
    }

    pub fn analysis(&self) -> Option<UserAnalysis> {
        self.lock().analysis.clone()
    }

    pub fn recommendations(&self) -> Vec<Movie> {
        self.lock().recommendations.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Probes the backend and records the outcome in the session
    pub async fn check_backend(&self, session: &mut SessionContext) -> BackendStatus {
        session.set_backend_status(BackendStatus::Checking);
        let status = if self.backend.check_health().await {
            BackendStatus::Connected
        } else {
            BackendStatus::Disconnected
        };
        session.set_backend_status(status);

        tracing::info!(
            backend = self.backend.name(),
            status = ?status,
            "Backend status updated"
        );
        status
    }

    /// Runs one capture through the pipeline
    ///
    /// Submissions made while a run is in flight, or before the backend is
    /// confirmed healthy, are ignored. Validation failures are returned
    /// without touching the run state; backend failures move the run to
    /// `error` and are returned as well. Dropping the future mid-run also
    /// leaves the run in `error`, so the next capture is accepted.
    pub async fn submit(
        &self,
        session: &SessionContext,
        image: ImagePayload,
    ) -> AppResult<Submission> {
        if !session.capture_enabled() {
            tracing::debug!(status = ?session.backend_status(), "Capture ignored, backend unavailable");
            return Ok(Submission::Ignored(IgnoreReason::BackendUnavailable));
        }

        {
            let mut state = self.lock();
            if state.tracker.is_busy() {
                tracing::info!(
                    status = %state.tracker.status(),
                    "Capture ignored, a run is already in progress"
                );
                return Ok(Submission::Ignored(IgnoreReason::Busy));
            }

            if let Err(e) = image.validate() {
                tracing::warn!(file = %image.file_name(), error = %e, "Capture rejected");
                return Err(e);
            }

            state.clear_results();
            state
                .tracker
                .begin()
                .map_err(|e| AppError::Internal(e.to_string()))?;
            self.publish(&state);
        }

        let run_id = RunId::new();
        let span = tracing::info_span!(
            "pipeline_run",
            run_id = %run_id,
            user = session.user_id().unwrap_or("anonymous"),
            file = %image.file_name(),
            bytes = image.len(),
        );

        let mut guard = RunGuard {
            pipeline: self,
            settled: false,
        };
        let result = self.drive(&image).instrument(span.clone()).await;
        let _entered = span.enter();
        guard.settled = true;

        let mut state = self.lock();
        match result {
            Ok(response) => {
                state
                    .tracker
                    .complete()
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                state.analysis = Some(response.analysis.clone());
                state.recommendations = response.recommendations.clone();
                self.publish(&state);

                tracing::info!(
                    emotion = %response.analysis.emotion,
                    movies = response.recommendations.len(),
                    "Run complete"
                );
                Ok(Submission::Completed(response))
            }
            Err(e) => {
                let message = e.to_string();
                state
                    .tracker
                    .fail(message.clone())
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                state.error = Some(message);
                self.publish(&state);

                tracing::error!(error = %e, "Run failed");
                Err(e)
            }
        }
    }

    /// Awaits the backend while the upload timer keeps advancing progress
    async fn drive(&self, image: &ImagePayload) -> AppResult<RecommendationResponse> {
        let request = self.backend.get_recommendations(image);
        tokio::pin!(request);

        let mut ticker = time::interval_at(Instant::now() + UPLOAD_TICK, UPLOAD_TICK);
        let analyzing = time::sleep(ANALYZING_AFTER);
        tokio::pin!(analyzing);
        let mut uploading = true;

        loop {
            tokio::select! {
                result = &mut request => return result,
                _ = ticker.tick(), if uploading => {
                    self.update(|tracker| tracker.advance());
                }
                _ = &mut analyzing, if uploading => {
                    uploading = false;
                    self.update(|tracker| {
                        if let Err(e) = tracker.start_analyzing() {
                            tracing::debug!(error = %e, "Analyzing transition skipped");
                        }
                    });
                    tracing::debug!("Upload finished, waiting for analysis");
                }
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut UploadTracker)) {
        let mut state = self.lock();
        f(&mut state.tracker);
        self.publish(&state);
    }

    fn publish(&self, state: &PipelineState) {
        self.progress_tx.send_replace(state.tracker.snapshot().clone());
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
