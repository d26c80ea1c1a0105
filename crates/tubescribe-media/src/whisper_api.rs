//! Hosted inference through an OpenAI-compatible `/audio/transcriptions`
//! endpoint (Groq by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};
use tubescribe_core::{AudioFile, EngineError, ResultExt, SpeechEngine, Transcript};
use tubescribe_settings::WhisperApiSettings;
use tubescribe_telemetry::metrics::{WHISPER_API_AUDIO_SECONDS_TOTAL, WHISPER_API_LIMITED_TOTAL};

use crate::rate_limit::UsageLimiter;
use crate::verbose::VerboseTranscript;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Speech engine backed by a hosted OpenAI-compatible API, with
/// process-local usage limits.
pub struct WhisperApiEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    max_file_mb: u64,
    limiter: UsageLimiter,
}

impl WhisperApiEngine {
    /// Build the HTTP client. A blank key is accepted here and reported as
    /// [`EngineError::Unavailable`] on first use.
    pub fn new(settings: &WhisperApiSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| EngineError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(settings.api_key.clone()),
            max_file_mb: settings.max_file_mb,
            limiter: UsageLimiter::new(settings.limits.clone()),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }
}

#[async_trait]
impl SpeechEngine for WhisperApiEngine {
    fn name(&self) -> &str {
        "whisper-api"
    }

    #[instrument(skip(self, audio))]
    async fn transcribe_audio(
        &self,
        audio: &AudioFile,
        model: &str,
    ) -> Result<Transcript, EngineError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(EngineError::Unavailable("no API key configured".into()));
        }

        let size_mb = audio.size_bytes() as f64 / BYTES_PER_MB;
        if size_mb > self.max_file_mb as f64 {
            return Err(EngineError::TooLarge {
                size_mb,
                limit_mb: self.max_file_mb,
            });
        }

        if let Err(limit) = self.limiter.check_and_record(audio.duration_seconds()) {
            metrics::counter!(WHISPER_API_LIMITED_TOTAL, "limit" => limit.as_str()).increment(1);
            warn!(%limit, "usage limit hit, skipping hosted transcription");
            return Err(EngineError::RateLimited(limit.to_string()));
        }

        let bytes = tokio::fs::read(audio.path()).await.decode("read audio")?;
        let file_name = audio
            .path()
            .file_name()
            .map_or_else(|| "audio.mp3".to_string(), |n| n.to_string_lossy().into_owned());
        let file_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .inference("mime")?;
        let form = Form::new()
            .part("file", file_part)
            .text("model", model.to_string())
            .text("response_format", "verbose_json");

        debug!(size_mb, "uploading audio");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .inference("request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(EngineError::RateLimited(format!("provider: {body}")));
            }
            return Err(EngineError::Inference(format!("status {status}: {body}")));
        }

        let parsed: VerboseTranscript = response.json().await.inference("response body")?;
        metrics::counter!(WHISPER_API_AUDIO_SECONDS_TOTAL)
            .increment(audio.duration_seconds().round() as u64);

        let transcript = parsed.into_transcript();
        if transcript.is_empty() {
            return Err(EngineError::EmptyOutput);
        }
        info!(segments = transcript.segments().len(), "hosted transcription complete");
        Ok(transcript)
    }
}
