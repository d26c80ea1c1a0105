//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a config
//! file may carry any subset of fields; missing ones keep their defaults.

use serde::{Deserialize, Serialize};

/// Root settings for the service.
///
/// ```json
/// {
///   "server": { "port": 10000 },
///   "transcription": { "backend": "whisper_api" },
///   "whisperApi": { "apiKey": "gsk_..." }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// HTTP listener and auth.
    pub server: ServerSettings,
    /// Orchestrator behavior.
    pub transcription: TranscriptionSettings,
    /// Local CLI backend.
    pub whisper_cli: WhisperCliSettings,
    /// Hosted API backend.
    pub whisper_api: WhisperApiSettings,
    /// Audio download tools.
    pub downloader: DownloaderSettings,
    /// Caption fallback.
    pub captions: CaptionSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Settings {
    /// Model used when a request does not name one.
    ///
    /// The hosted API has its own model catalogue, so it uses its own default.
    pub fn default_model(&self) -> &str {
        match self.transcription.backend {
            Backend::WhisperCli => &self.transcription.default_model,
            Backend::WhisperApi => &self.whisper_api.model,
        }
    }
}

/// HTTP listener and endpoint authentication.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Interface to bind (`HOST`).
    pub host: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Bearer token required on `/transcribe`.
    pub api_token: String,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
            api_token: "your-secret-token".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_token", &"[REDACTED]")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Which speech engine backs the model path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Local `whisper` CLI.
    #[default]
    WhisperCli,
    /// OpenAI-compatible hosted transcription API.
    WhisperApi,
}

/// Orchestrator behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionSettings {
    /// When false the model path is skipped and captions are used directly.
    pub model_enabled: bool,
    /// Engine used when the model path is enabled.
    pub backend: Backend,
    /// Default model for the local CLI backend (`WHISPER_MODEL`).
    pub default_model: String,
    /// Limit for download plus inference, in seconds.
    pub deadline_secs: u64,
    /// Audio longer than this is clipped and the result marked partial.
    pub max_audio_secs: Option<u64>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model_enabled: true,
            backend: Backend::WhisperCli,
            default_model: "tiny".to_string(),
            deadline_secs: 900,
            max_audio_secs: None,
        }
    }
}

/// Local `whisper` command-line tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhisperCliSettings {
    /// Executable name or path.
    pub binary: String,
    /// Concurrent inference runs allowed; each one loads the model.
    pub max_concurrent: usize,
    /// Appended to every invocation, e.g. `--language en`.
    pub extra_args: Vec<String>,
}

impl Default for WhisperCliSettings {
    fn default() -> Self {
        Self {
            binary: "whisper".to_string(),
            max_concurrent: 1,
            extra_args: Vec::new(),
        }
    }
}

/// Hosted OpenAI-compatible transcription API (Groq by default).
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhisperApiSettings {
    /// API root, without `/audio/transcriptions`.
    pub base_url: String,
    /// Bearer key (`GROQ_API_KEY`); the backend is unusable when blank.
    pub api_key: String,
    /// Default model for this backend.
    pub model: String,
    /// Per-file upload limit in megabytes.
    pub max_file_mb: u64,
    /// HTTP timeout per upload.
    pub timeout_secs: u64,
    /// Provider quotas.
    pub limits: UsageLimitSettings,
}

impl Default for WhisperApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "whisper-large-v3-turbo".to_string(),
            max_file_mb: 25,
            timeout_secs: 300,
            limits: UsageLimitSettings::default(),
        }
    }
}

impl std::fmt::Debug for WhisperApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperApiSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_file_mb", &self.max_file_mb)
            .field("timeout_secs", &self.timeout_secs)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Provider quotas tracked in-process.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageLimitSettings {
    /// Requests admitted per minute.
    pub requests_per_minute: u32,
    /// Requests admitted per day.
    pub requests_per_day: u32,
    /// Audio seconds admitted per hour.
    pub audio_seconds_per_hour: u64,
    /// Audio seconds admitted per day.
    pub audio_seconds_per_day: u64,
}

impl Default for UsageLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: 20,
            requests_per_day: 2000,
            audio_seconds_per_hour: 7200,
            audio_seconds_per_day: 28_800,
        }
    }
}

/// External media tools used to obtain audio.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloaderSettings {
    /// `yt-dlp` executable.
    pub yt_dlp: String,
    /// `ffmpeg` executable.
    pub ffmpeg: String,
    /// `ffprobe` executable.
    pub ffprobe: String,
    /// yt-dlp format selector.
    pub format: String,
    /// Passed to `yt-dlp --socket-timeout`.
    pub socket_timeout_secs: u64,
    /// Parent directory for per-request temp dirs; system temp when unset.
    pub work_dir: Option<String>,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            format: "bestaudio/best".to_string(),
            socket_timeout_secs: 30,
            work_dir: None,
        }
    }
}

/// Platform caption fallback.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionSettings {
    /// Site root serving `/watch` and the timed-text API.
    pub base_url: String,
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
    /// HTTP timeout per caption request.
    pub timeout_secs: u64,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            languages: vec!["en".to_string()],
            timeout_secs: 30,
        }
    }
}

/// Log output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// One JSON object per line instead of plain text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
