//! Request and result types exchanged with the orchestrator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One timed piece of a transcript. Times are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset.
    pub start: f64,
    /// End offset.
    pub end: f64,
    /// Spoken text, trimmed.
    pub text: String,
}

impl Segment {
    /// Segment spanning `start..end`.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Transcript text: timed segments when available, otherwise an opaque blob.
#[derive(Clone, Debug, PartialEq)]
pub enum Transcript {
    /// Ordered timed segments.
    Segments(Vec<Segment>),
    /// Untimed text.
    Blob(String),
}

impl Transcript {
    /// Build from whatever an engine returned, preferring timed segments.
    ///
    /// Segment texts are trimmed and whitespace-only segments are dropped.
    pub fn from_parts(text: &str, segments: Vec<Segment>) -> Self {
        let segments: Vec<Segment> = segments
            .into_iter()
            .filter_map(|s| {
                let trimmed = s.text.trim();
                (!trimmed.is_empty()).then(|| Segment::new(s.start, s.end, trimmed))
            })
            .collect();
        if segments.is_empty() {
            Self::Blob(text.trim().to_string())
        } else {
            Self::Segments(segments)
        }
    }

    /// Full transcript text. Segments are joined with single spaces.
    pub fn full_text(&self) -> String {
        match self {
            Self::Segments(segments) => segments
                .iter()
                .map(|s| s.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Blob(text) => text.trim().to_string(),
        }
    }

    /// Timed segments; empty for a blob.
    pub fn segments(&self) -> &[Segment] {
        match self {
            Self::Segments(segments) => segments,
            Self::Blob(_) => &[],
        }
    }

    /// True when there is no usable text at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Segments(segments) => segments.iter().all(|s| s.text.trim().is_empty()),
            Self::Blob(text) => text.trim().is_empty(),
        }
    }
}

/// Which path produced the transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Speech recognition on the downloaded audio.
    Model,
    /// Captions published with the video.
    Captions,
}

impl Source {
    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Captions => "captions",
        }
    }
}

/// Outcome of a transcription call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Full transcript.
    Ok,
    /// Transcript of the first part of the audio only.
    Partial,
    /// No transcript; see `error_detail`.
    Failed,
}

impl Status {
    /// Lowercase name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// A single transcription call. Built per request, never persisted.
#[derive(Clone, Debug, Default)]
pub struct TranscriptionRequest {
    /// URL or bare id of the video.
    pub video_reference: String,
    /// Model variant; the process default when `None` or blank.
    pub requested_model: Option<String>,
    /// Limit for the model step; the configured default applies when unset.
    pub deadline: Option<Duration>,
}

impl TranscriptionRequest {
    /// Request for `video_reference` with every option at its default.
    pub fn new(video_reference: impl Into<String>) -> Self {
        Self {
            video_reference: video_reference.into(),
            ..Default::default()
        }
    }

    /// Ask for a specific model variant.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.requested_model = Some(model.into());
        self
    }

    /// Override the model-step deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The requested model, ignoring blank values.
    pub fn model(&self) -> Option<&str> {
        self.requested_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Normalized outcome returned to the HTTP layer.
///
/// Construct through the associated functions, which keep `source`, `status`
/// and `error_detail` consistent with each other.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptionResult {
    /// Path that produced `text`, or the last one tried.
    pub source: Source,
    /// Overall outcome.
    pub status: Status,
    /// Transcript; `None` only when `status` is `Failed`.
    pub text: Option<Transcript>,
    /// Diagnostic; present exactly when `status` is not `Ok`.
    pub error_detail: Option<String>,
    /// Model that produced the text; set only for [`Source::Model`].
    pub model: Option<String>,
}

impl TranscriptionResult {
    /// Complete model transcript.
    pub fn from_model(text: Transcript, model: impl Into<String>) -> Self {
        Self {
            source: Source::Model,
            status: Status::Ok,
            text: Some(text),
            error_detail: None,
            model: Some(model.into()),
        }
    }

    /// Model output that covers only part of the audio.
    pub fn partial_from_model(
        text: Transcript,
        model: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            source: Source::Model,
            status: Status::Partial,
            text: Some(text),
            error_detail: Some(detail.into()),
            model: Some(model.into()),
        }
    }

    /// Caption transcript after the model path missed.
    pub fn from_captions(text: Transcript) -> Self {
        Self {
            source: Source::Captions,
            status: Status::Ok,
            text: Some(text),
            error_detail: None,
            model: None,
        }
    }

    /// Both paths exhausted.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            source: Source::Captions,
            status: Status::Failed,
            text: None,
            error_detail: Some(detail.into()),
            model: None,
        }
    }

    /// Transcript text, empty when failed.
    pub fn full_text(&self) -> String {
        self.text.as_ref().map(Transcript::full_text).unwrap_or_default()
    }

    /// Timed segments, empty when failed or untimed.
    pub fn segments(&self) -> &[Segment] {
        match &self.text {
            Some(text) => text.segments(),
            None => &[],
        }
    }
}

/// Render whole seconds as `H:MM:SS`; the fraction is truncated.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_timestamp_truncates() {
        assert_eq!(format_timestamp(0.0), "0:00:00");
        assert_eq!(format_timestamp(4.99), "0:00:04");
        assert_eq!(format_timestamp(61.2), "0:01:01");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
        assert_eq!(format_timestamp(90_000.0), "25:00:00");
    }

    #[test]
    fn format_timestamp_clamps_bad_input() {
        assert_eq!(format_timestamp(-3.0), "0:00:00");
        assert_eq!(format_timestamp(f64::NAN), "0:00:00");
    }

    #[test]
    fn from_parts_prefers_segments_and_trims() {
        let t = Transcript::from_parts(
            " hello world ",
            vec![
                Segment::new(0.0, 1.0, " hello "),
                Segment::new(1.0, 1.5, "   "),
                Segment::new(1.5, 2.0, "world"),
            ],
        );
        assert_eq!(t.segments().len(), 2);
        assert_eq!(t.segments()[0].text, "hello");
        assert_eq!(t.full_text(), "hello world");
    }

    #[test]
    fn from_parts_falls_back_to_blob() {
        let t = Transcript::from_parts("  just text ", Vec::new());
        assert_eq!(t, Transcript::Blob("just text".into()));
        assert!(t.segments().is_empty());
    }

    #[test]
    fn emptiness() {
        assert!(Transcript::Blob("  \n".into()).is_empty());
        assert!(Transcript::Segments(Vec::new()).is_empty());
        assert!(Transcript::from_parts("", vec![Segment::new(0.0, 1.0, " ")]).is_empty());
        assert!(!Transcript::Blob("x".into()).is_empty());
    }

    #[test]
    fn request_model_ignores_blank() {
        assert_eq!(TranscriptionRequest::new("x").model(), None);
        assert_eq!(TranscriptionRequest::new("x").with_model("  ").model(), None);
        assert_eq!(TranscriptionRequest::new("x").with_model(" base ").model(), Some("base"));
    }

    #[test]
    fn constructors_keep_invariants() {
        let ok = TranscriptionResult::from_model(Transcript::Blob("hi".into()), "tiny");
        assert_eq!((ok.source, ok.status), (Source::Model, Status::Ok));
        assert!(ok.error_detail.is_none());
        assert_eq!(ok.model.as_deref(), Some("tiny"));

        let partial = TranscriptionResult::partial_from_model(
            Transcript::Blob("hi".into()),
            "tiny",
            "clipped",
        );
        assert_eq!(partial.status, Status::Partial);
        assert_eq!(partial.error_detail.as_deref(), Some("clipped"));

        let captions = TranscriptionResult::from_captions(Transcript::Blob("hi".into()));
        assert_eq!((captions.source, captions.status), (Source::Captions, Status::Ok));
        assert!(captions.model.is_none());

        let failed = TranscriptionResult::failed("both down");
        assert_eq!((failed.source, failed.status), (Source::Captions, Status::Failed));
        assert!(failed.text.is_none());
        assert_eq!(failed.full_text(), "");
        assert!(failed.segments().is_empty());
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Source::Captions).unwrap(), "captions");
        assert_eq!(serde_json::to_value(Status::Partial).unwrap(), "partial");
        assert_eq!(Source::Model.as_str(), "model");
        assert_eq!(Status::Failed.as_str(), "failed");
    }
}
