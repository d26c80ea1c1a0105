//! Error taxonomy.
//!
//! Only [`InvalidRequest`] ever reaches the caller of the orchestrator.
//! [`EngineError`] and [`CaptionError`] are downstream failures that the
//! orchestrator converts into a fallback attempt or a `FAILED` result.

use std::time::Duration;

/// Malformed input, rejected before any collaborator is invoked.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    /// Reference is empty or whitespace.
    #[error("video reference is empty")]
    EmptyReference,
    /// No video id could be extracted from the reference.
    #[error("not a recognizable YouTube video reference: {0}")]
    UnrecognizedReference(String),
}

/// Failure anywhere on the model path: audio download, conversion or inference.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EngineError {
    /// The downloader could not fetch the video.
    #[error("download failed: {0}")]
    Download(String),
    /// Audio conversion or probing failed.
    #[error("audio decode failed: {0}")]
    Decode(String),
    /// The model invocation itself failed.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The model ran but produced no text.
    #[error("engine returned no text")]
    EmptyOutput,
    /// Audio exceeds what the engine accepts.
    #[error("audio too large: {size_mb:.1} MB exceeds {limit_mb} MB")]
    TooLarge {
        /// Size of the audio file.
        size_mb: f64,
        /// Upload limit of the engine.
        limit_mb: u64,
    },
    /// A usage quota would be exceeded.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The model step ran past its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// The engine is not usable in this deployment (missing binary, no key).
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Short classification string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Download(_) => "download",
            Self::Decode(_) => "decode",
            Self::Inference(_) => "inference",
            Self::EmptyOutput => "empty_output",
            Self::TooLarge { .. } => "too_large",
            Self::RateLimited(_) => "rate_limited",
            Self::Timeout(_) => "timeout",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Failure fetching platform captions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CaptionError {
    /// The video has no usable caption track.
    #[error("not found")]
    NotFound,
    /// The uploader turned captions off.
    #[error("disabled for this video")]
    Disabled,
    /// Page or caption endpoint unreachable, or the video is unplayable.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl CaptionError {
    /// Short classification string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Disabled => "disabled",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Extension trait to reduce `.map_err()` boilerplate in the adapters.
pub trait ResultExt<T> {
    /// Wrap the error as [`EngineError::Download`] with `context` prefix.
    fn download(self, context: &str) -> Result<T, EngineError>;
    /// Wrap the error as [`EngineError::Decode`] with `context` prefix.
    fn decode(self, context: &str) -> Result<T, EngineError>;
    /// Wrap the error as [`EngineError::Inference`] with `context` prefix.
    fn inference(self, context: &str) -> Result<T, EngineError>;
    /// Wrap the error as [`CaptionError::Unavailable`] with `context` prefix.
    fn captions_unavailable(self, context: &str) -> Result<T, CaptionError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn download(self, context: &str) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::Download(format!("{context}: {e}")))
    }
    fn decode(self, context: &str) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::Decode(format!("{context}: {e}")))
    }
    fn inference(self, context: &str) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::Inference(format!("{context}: {e}")))
    }
    fn captions_unavailable(self, context: &str) -> Result<T, CaptionError> {
        self.map_err(|e| CaptionError::Unavailable(format!("{context}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn caption_not_found_display_is_terse() {
        assert_eq!(CaptionError::NotFound.to_string(), "not found");
    }

    #[test]
    fn engine_error_display() {
        let e = EngineError::TooLarge {
            size_mb: 31.3,
            limit_mb: 25,
        };
        assert_eq!(e.to_string(), "audio too large: 31.3 MB exceeds 25 MB");

        let e = EngineError::Timeout(Duration::from_secs(30));
        assert_eq!(e.to_string(), "timed out after 30s");
    }

    #[test]
    fn kinds_are_snake_case() {
        let kinds = [
            EngineError::Download(String::new()).kind(),
            EngineError::Decode(String::new()).kind(),
            EngineError::Inference(String::new()).kind(),
            EngineError::EmptyOutput.kind(),
            EngineError::TooLarge { size_mb: 0.0, limit_mb: 0 }.kind(),
            EngineError::RateLimited(String::new()).kind(),
            EngineError::Timeout(Duration::ZERO).kind(),
            EngineError::Unavailable(String::new()).kind(),
            CaptionError::NotFound.kind(),
            CaptionError::Disabled.kind(),
            CaptionError::Unavailable(String::new()).kind(),
        ];
        for kind in kinds {
            assert!(kind.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{kind}");
        }
    }

    #[test]
    fn result_ext_contexts() {
        let err: Result<(), &str> = Err("exit status 1");
        assert_matches!(err.download("yt-dlp"), Err(EngineError::Download(s)) if s == "yt-dlp: exit status 1");

        let err: Result<(), &str> = Err("no stream");
        assert_matches!(err.decode("ffmpeg"), Err(EngineError::Decode(s)) if s == "ffmpeg: no stream");

        let err: Result<(), &str> = Err("oom");
        assert_matches!(err.inference("whisper"), Err(EngineError::Inference(s)) if s == "whisper: oom");

        let err: Result<(), &str> = Err("dns");
        assert_matches!(
            err.captions_unavailable("watch page"),
            Err(CaptionError::Unavailable(s)) if s == "watch page: dns"
        );
    }

    #[test]
    fn result_ext_ok_passthrough() {
        let ok: Result<i32, &str> = Ok(7);
        assert_eq!(ok.inference("ctx").unwrap(), 7);
    }
}
