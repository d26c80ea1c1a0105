//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If a config file is given and exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{Backend, Settings};

/// Load settings from an optional config file with process env overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Load settings, reading environment values through `env`.
///
/// A missing file yields defaults; a file with invalid JSON is an error.
pub fn load_settings_with<F>(path: Option<&Path>, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = match path {
        Some(path) if path.exists() => {
            debug!(?path, "loading config file");
            let content =
                std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            let user: Value =
                serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            deep_merge(defaults, user)
        }
        Some(path) => {
            debug!(?path, "config file not found, using defaults");
            defaults
        }
        None => defaults,
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// - Integers must parse and fall within the given range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (file/default value stays)
pub fn apply_env_overrides<F>(settings: &mut Settings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let reader = EnvReader { env };

    // ── Server and default model ───────────────────────────────────
    if let Some(v) = reader.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = reader.string("HOST") {
        settings.server.host = v;
    }
    if let Some(v) = reader.string("API_TOKEN") {
        settings.server.api_token = v;
    }
    if let Some(v) = reader.string("WHISPER_MODEL") {
        settings.transcription.default_model = v;
    }
    if let Some(v) = reader.string("GROQ_API_KEY") {
        settings.whisper_api.api_key = v;
    }

    // ── Transcription ───────────────────────────────────────────────
    if let Some(v) = reader.bool("TUBESCRIBE_MODEL_ENABLED") {
        settings.transcription.model_enabled = v;
    }
    if let Some(v) = reader.string("TUBESCRIBE_BACKEND") {
        match serde_json::from_value::<Backend>(Value::String(v.clone())) {
            Ok(backend) => settings.transcription.backend = backend,
            Err(_) => {
                tracing::warn!(key = "TUBESCRIBE_BACKEND", value = %v, "unknown backend, ignoring");
            }
        }
    }
    if let Some(v) = reader.u64("TUBESCRIBE_DEADLINE_SECS", 1, 86_400) {
        settings.transcription.deadline_secs = v;
    }
    if let Some(v) = reader.u64("TUBESCRIBE_MAX_AUDIO_SECS", 1, 86_400) {
        settings.transcription.max_audio_secs = Some(v);
    }

    // ── Engines ─────────────────────────────────────────────────────
    if let Some(v) = reader.string("TUBESCRIBE_WHISPER_BIN") {
        settings.whisper_cli.binary = v;
    }
    if let Some(v) = reader.u64("TUBESCRIBE_WHISPER_CONCURRENCY", 1, 64) {
        settings.whisper_cli.max_concurrent = v as usize;
    }
    if let Some(v) = reader.string("TUBESCRIBE_WHISPER_API_URL") {
        settings.whisper_api.base_url = v;
    }
    if let Some(v) = reader.string("TUBESCRIBE_WHISPER_API_MODEL") {
        settings.whisper_api.model = v;
    }

    // ── Media tools ─────────────────────────────────────────────────
    if let Some(v) = reader.string("TUBESCRIBE_YT_DLP_BIN") {
        settings.downloader.yt_dlp = v;
    }
    if let Some(v) = reader.string("TUBESCRIBE_FFMPEG_BIN") {
        settings.downloader.ffmpeg = v;
    }
    if let Some(v) = reader.string("TUBESCRIBE_FFPROBE_BIN") {
        settings.downloader.ffprobe = v;
    }
    if let Some(v) = reader.string("TUBESCRIBE_WORK_DIR") {
        settings.downloader.work_dir = Some(v);
    }

    // ── Captions ────────────────────────────────────────────────────
    if let Some(v) = reader.string("TUBESCRIBE_CAPTION_LANGS") {
        let langs = parse_list(&v);
        if !langs.is_empty() {
            settings.captions.languages = langs;
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = reader.string("TUBESCRIBE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = reader.bool("TUBESCRIBE_LOG_JSON") {
        settings.logging.json = v;
    }
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.server.api_token.trim().is_empty() {
        return Err(SettingsError::Invalid {
            field: "server.apiToken",
            reason: "must not be empty",
        });
    }
    if settings.whisper_cli.max_concurrent == 0 {
        return Err(SettingsError::Invalid {
            field: "whisperCli.maxConcurrent",
            reason: "must be at least 1",
        });
    }
    if settings.default_model().trim().is_empty() {
        let field = match settings.transcription.backend {
            Backend::WhisperCli => "transcription.defaultModel",
            Backend::WhisperApi => "whisperApi.model",
        };
        return Err(SettingsError::Invalid {
            field,
            reason: "must not be empty",
        });
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Env readers (thin wrappers) ─────────────────────────────────────────────

struct EnvReader<F> {
    env: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.string(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 7860, "host": "0.0.0.0"}});
        let source = serde_json::json!({"server": {"port": 10000}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 10000);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"languages": ["en", "de"]});
        let source = serde_json::json!({"languages": ["fr"]});
        assert_eq!(deep_merge(target, source)["languages"], serde_json::json!(["fr"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn no_path_returns_defaults() {
        let settings = load_settings_with(None, no_env).unwrap();
        assert_eq!(settings.server.port, 7860);
    }

    #[test]
    fn missing_file_returns_defaults() {
        let settings =
            load_settings_with(Some(Path::new("/nonexistent/tubescribe.json")), no_env).unwrap();
        assert_eq!(settings.transcription.default_model, "tiny");
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubescribe.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 10000}, "whisperApi": {"limits": {"requestsPerMinute": 5}}}"#,
        )
        .unwrap();

        let settings = load_settings_with(Some(path.as_path()), no_env).unwrap();
        assert_eq!(settings.server.port, 10000);
        assert_eq!(settings.whisper_api.limits.requests_per_minute, 5);
        assert_eq!(settings.whisper_api.limits.requests_per_day, 2000);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubescribe.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_matches!(
            load_settings_with(Some(path.as_path()), no_env),
            Err(SettingsError::Parse { path: p, .. }) if p == path
        );
    }

    #[test]
    fn wrong_value_type_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubescribe.json");
        std::fs::write(&path, r#"{"server": {"port": "high"}}"#).unwrap();
        assert_matches!(
            load_settings_with(Some(path.as_path()), no_env),
            Err(SettingsError::Schema(_))
        );
    }

    // ── env layer ───────────────────────────────────────────────────

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubescribe.json");
        std::fs::write(&path, r#"{"transcription": {"defaultModel": "base"}}"#).unwrap();

        let env = env_of(&[("WHISPER_MODEL", "small"), ("PORT", "10000"), ("API_TOKEN", "t0k")]);
        let settings = load_settings_with(Some(path.as_path()), env).unwrap();
        assert_eq!(settings.transcription.default_model, "small");
        assert_eq!(settings.server.port, 10000);
        assert_eq!(settings.server.api_token, "t0k");
    }

    #[test]
    fn env_backend_and_flags() {
        let env = env_of(&[
            ("TUBESCRIBE_BACKEND", "whisper_api"),
            ("TUBESCRIBE_MODEL_ENABLED", "off"),
            ("GROQ_API_KEY", "gsk"),
            ("TUBESCRIBE_MAX_AUDIO_SECS", "600"),
            ("TUBESCRIBE_CAPTION_LANGS", "de, en ,"),
        ]);
        let settings = load_settings_with(None, env).unwrap();
        assert_eq!(settings.transcription.backend, Backend::WhisperApi);
        assert!(!settings.transcription.model_enabled);
        assert_eq!(settings.whisper_api.api_key, "gsk");
        assert_eq!(settings.transcription.max_audio_secs, Some(600));
        assert_eq!(settings.captions.languages, vec!["de", "en"]);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let env = env_of(&[
            ("PORT", "99999"),
            ("TUBESCRIBE_BACKEND", "cloud"),
            ("TUBESCRIBE_MODEL_ENABLED", "maybe"),
            ("TUBESCRIBE_DEADLINE_SECS", "0"),
        ]);
        let settings = load_settings_with(None, env).unwrap();
        assert_eq!(settings.server.port, 7860);
        assert_eq!(settings.transcription.backend, Backend::WhisperCli);
        assert!(settings.transcription.model_enabled);
        assert_eq!(settings.transcription.deadline_secs, 900);
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let settings = load_settings_with(None, env_of(&[("API_TOKEN", "")])).unwrap();
        assert_eq!(settings.server.api_token, "your-secret-token");
    }

    #[test]
    fn blank_token_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubescribe.json");
        std::fs::write(&path, r#"{"server": {"apiToken": "  "}}"#).unwrap();
        assert_matches!(
            load_settings_with(Some(path.as_path()), no_env),
            Err(SettingsError::Invalid { field: "server.apiToken", .. })
        );
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for v in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["false", "0", "No", "off"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("8080", 1, 65535), Some(8080));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u64_range("abc", 0, 10), None);
        assert_eq!(parse_u64_range("10", 0, 10), Some(10));
    }
}
