//! # tubescribe-settings
//!
//! Configuration with layered sources for the tubescribe service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`Settings::default()`]
//! 2. **Config file**: optional JSON file (deep-merged over defaults)
//! 3. **Environment variables**: `WHISPER_MODEL`, `API_TOKEN`, `PORT`,
//!    `GROQ_API_KEY` and `TUBESCRIBE_*` overrides (highest priority)
//!
//! The loaded value is built once at startup and handed to the components
//! that need it; nothing reads configuration through a global.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_with};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_documented_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 7860);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.api_token, "your-secret-token");
        assert_eq!(settings.transcription.default_model, "tiny");
        assert!(settings.transcription.model_enabled);
        assert_eq!(settings.transcription.backend, Backend::WhisperCli);
        assert_eq!(settings.whisper_api.model, "whisper-large-v3-turbo");
        assert_eq!(settings.whisper_api.max_file_mb, 25);
        assert_eq!(settings.whisper_api.limits.requests_per_minute, 20);
        assert_eq!(settings.whisper_api.limits.audio_seconds_per_day, 28_800);
        assert_eq!(settings.downloader.socket_timeout_secs, 30);
        assert_eq!(settings.captions.languages, vec!["en".to_string()]);
    }

    #[test]
    fn deep_merge_re_exported() {
        let merged = deep_merge(serde_json::json!({"x": 1}), serde_json::json!({"y": 2}));
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
