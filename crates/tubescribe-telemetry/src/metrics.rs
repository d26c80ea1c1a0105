//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Install the Prometheus metrics recorder (global).
///
/// Returns `None` if a recorder is already installed.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("prometheus metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "failed to install metrics recorder");
            None
        }
    }
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across crates.

/// Transcription calls finished (counter, labels: source, status).
pub const TRANSCRIBE_REQUESTS_TOTAL: &str = "transcribe_requests_total";
/// Model path failures that triggered the caption fallback (counter, labels: reason).
pub const TRANSCRIBE_FALLBACKS_TOTAL: &str = "transcribe_fallbacks_total";
/// Caption fetch failures (counter, labels: reason).
pub const CAPTION_FAILURES_TOTAL: &str = "caption_failures_total";
/// End-to-end transcription duration (histogram, labels: source).
pub const TRANSCRIBE_DURATION_SECONDS: &str = "transcribe_duration_seconds";
/// Audio seconds sent to the hosted API (counter).
pub const WHISPER_API_AUDIO_SECONDS_TOTAL: &str = "whisper_api_audio_seconds_total";
/// Requests rejected by the local usage limiter (counter, labels: limit).
pub const WHISPER_API_LIMITED_TOTAL: &str = "whisper_api_limited_total";
/// HTTP requests rejected by bearer auth (counter, labels: reason).
pub const AUTH_REJECTIONS_TOTAL: &str = "auth_rejections_total";
