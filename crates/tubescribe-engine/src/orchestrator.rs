//! Model-first transcription with caption fallback.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use tubescribe_core::{
    AudioSource, CaptionSource, EngineError, InvalidRequest, SpeechEngine, Transcript,
    TranscriptionRequest, TranscriptionResult, VideoReference,
};
use tubescribe_settings::Settings;
use tubescribe_telemetry::metrics::{
    CAPTION_FAILURES_TOTAL, TRANSCRIBE_DURATION_SECONDS, TRANSCRIBE_FALLBACKS_TOTAL,
    TRANSCRIBE_REQUESTS_TOTAL,
};

/// Process-wide orchestrator configuration, fixed at startup.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// When false the model path is skipped entirely.
    pub model_enabled: bool,
    /// Model used when the request names none.
    pub default_model: String,
    /// Limit for audio fetch plus inference.
    pub deadline: Duration,
}

impl OrchestratorConfig {
    /// Read the model flag, default model and deadline from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model_enabled: settings.transcription.model_enabled,
            default_model: settings.default_model().to_string(),
            deadline: Duration::from_secs(settings.transcription.deadline_secs),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Why the model path did not produce the result.
#[derive(Debug)]
enum ModelMiss {
    Disabled,
    Failed(EngineError),
}

impl ModelMiss {
    fn kind(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Failed(e) => e.kind(),
        }
    }
}

impl fmt::Display for ModelMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("model disabled"),
            Self::Failed(e) => write!(f, "model: {e}"),
        }
    }
}

/// Runs one transcription per call. Holds no per-request state, so a single
/// instance is shared across all concurrent requests.
pub struct Orchestrator {
    audio: Arc<dyn AudioSource>,
    engine: Option<Arc<dyn SpeechEngine>>,
    captions: Arc<dyn CaptionSource>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// `engine = None` behaves like `model_enabled = false`.
    pub fn new(
        audio: Arc<dyn AudioSource>,
        engine: Option<Arc<dyn SpeechEngine>>,
        captions: Arc<dyn CaptionSource>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            audio,
            engine,
            captions,
            config,
        }
    }

    /// Configuration fixed at startup.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Whether calls will try the model before captions.
    pub fn model_path_active(&self) -> bool {
        self.config.model_enabled && self.engine.is_some()
    }

    /// Transcribe the referenced video.
    ///
    /// Only a malformed reference is an error. Every downstream failure ends
    /// up in the returned result, as a fallback or as `Status::Failed`.
    #[instrument(skip_all, fields(video = %request.video_reference))]
    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResult, InvalidRequest> {
        let started = Instant::now();
        let video = VideoReference::parse(&request.video_reference)?;

        let miss = match self.run_model(&video, &request).await {
            Ok(result) => {
                record(&result, started);
                return Ok(result);
            }
            Err(miss) => miss,
        };

        if let ModelMiss::Failed(e) = &miss {
            warn!(video_id = %video.id(), error = %e, "model transcription failed, falling back to captions");
        }
        metrics::counter!(TRANSCRIBE_FALLBACKS_TOTAL, "reason" => miss.kind()).increment(1);

        let result = match self.captions.fetch_captions(&video).await {
            Ok(text) => {
                info!(video_id = %video.id(), source = self.captions.name(), "caption fallback succeeded");
                TranscriptionResult::from_captions(text)
            }
            Err(e) => {
                metrics::counter!(CAPTION_FAILURES_TOTAL, "reason" => e.kind()).increment(1);
                warn!(video_id = %video.id(), error = %e, "caption fallback failed");
                TranscriptionResult::failed(format!("{miss}; captions: {e}"))
            }
        };
        record(&result, started);
        Ok(result)
    }

    async fn run_model(
        &self,
        video: &VideoReference,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptionResult, ModelMiss> {
        let engine = match &self.engine {
            Some(engine) if self.config.model_enabled => engine,
            _ => return Err(ModelMiss::Disabled),
        };
        let model = request.model().unwrap_or(&self.config.default_model);
        let deadline = request.deadline.unwrap_or(self.config.deadline);

        // The audio (and its temp dir) is dropped when this block ends.
        let attempt = async {
            let audio = self.audio.fetch_audio(video).await?;
            let text = engine.transcribe_audio(&audio, model).await?;
            Ok::<(Transcript, Option<f64>), EngineError>((text, audio.clip()))
        };

        let (text, clip) = match tokio::time::timeout(deadline, attempt).await {
            Ok(outcome) => outcome.map_err(ModelMiss::Failed)?,
            Err(_) => return Err(ModelMiss::Failed(EngineError::Timeout(deadline))),
        };
        if text.is_empty() {
            return Err(ModelMiss::Failed(EngineError::EmptyOutput));
        }

        info!(video_id = %video.id(), model, engine = engine.name(), "model transcription complete");
        Ok(match clip {
            Some(secs) => TranscriptionResult::partial_from_model(
                text,
                model,
                format!("audio clipped to the first {} seconds", secs.round() as u64),
            ),
            None => TranscriptionResult::from_model(text, model),
        })
    }
}

fn record(result: &TranscriptionResult, started: Instant) {
    let source = result.source.as_str();
    metrics::counter!(
        TRANSCRIBE_REQUESTS_TOTAL,
        "source" => source,
        "status" => result.status.as_str()
    )
    .increment(1);
    metrics::histogram!(TRANSCRIBE_DURATION_SECONDS, "source" => source)
        .record(started.elapsed().as_secs_f64());
}
