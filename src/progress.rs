//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the request moves through its stages. The callback approach is
//! the least-invasive integration point: callers can forward events to a
//! terminal spinner, a channel, or a log line without the library knowing
//! how the host application communicates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The stages a request passes through, in order.
///
/// A request that fails stops at its current stage; there is no retry or
/// resumption, the caller must submit a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStage {
    /// Converting the document's first page to an image.
    Rasterizing,
    /// Waiting on the remote vision model.
    Inferring,
    /// Recovering the JSON object from the model reply.
    Parsing,
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionStage::Rasterizing => "rasterizing",
            ExtractionStage::Inferring => "inferring",
            ExtractionStage::Parsing => "parsing",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as the request advances.
///
/// Implementations must be `Send + Sync`. All methods have default no-op
/// implementations so callers only override what they care about. The
/// pipeline runs one request at a time, but the rasterisation stage fires
/// from a blocking-pool thread, so shared state still needs synchronisation.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any stage runs.
    fn on_extraction_start(&self) {}

    /// Called as each stage begins.
    fn on_stage_start(&self, stage: ExtractionStage) {
        let _ = stage;
    }

    /// Called when a stage completes successfully.
    ///
    /// # Arguments
    /// * `stage`       — the completed stage
    /// * `duration_ms` — wall-clock time the stage took
    fn on_stage_complete(&self, stage: ExtractionStage, duration_ms: u64) {
        let _ = (stage, duration_ms);
    }

    /// Called once when the whole request succeeds.
    fn on_extraction_complete(&self, total_duration_ms: u64) {
        let _ = total_duration_ms;
    }

    /// Called once when the request fails, with the stage it failed in.
    fn on_extraction_error(&self, stage: ExtractionStage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        failed_in: Mutex<Option<ExtractionStage>>,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_stage_start(&self, _stage: ExtractionStage) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_complete(&self, _stage: ExtractionStage, _duration_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_error(&self, stage: ExtractionStage, _error: &str) {
            *self.failed_in.lock().unwrap() = Some(stage);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start();
        cb.on_stage_start(ExtractionStage::Rasterizing);
        cb.on_stage_complete(ExtractionStage::Rasterizing, 12);
        cb.on_extraction_error(ExtractionStage::Inferring, "boom");
        cb.on_extraction_complete(340);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let cb = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            failed_in: Mutex::new(None),
        };

        cb.on_stage_start(ExtractionStage::Rasterizing);
        cb.on_stage_complete(ExtractionStage::Rasterizing, 80);
        cb.on_stage_start(ExtractionStage::Inferring);
        cb.on_extraction_error(ExtractionStage::Inferring, "HTTP 503");

        assert_eq!(cb.starts.load(Ordering::SeqCst), 2);
        assert_eq!(cb.completes.load(Ordering::SeqCst), 1);
        assert_eq!(
            *cb.failed_in.lock().unwrap(),
            Some(ExtractionStage::Inferring)
        );
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(ExtractionStage::Rasterizing.to_string(), "rasterizing");
        assert_eq!(ExtractionStage::Inferring.to_string(), "inferring");
        assert_eq!(ExtractionStage::Parsing.to_string(), "parsing");
    }
}
