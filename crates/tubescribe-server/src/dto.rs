//! Wire types for `/transcribe`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tubescribe_core::{
    Segment, Source, Status, TranscriptionRequest, TranscriptionResult, format_timestamp,
};

/// Request body.
#[derive(Clone, Debug, Deserialize)]
pub struct TranscribeBody {
    /// Video URL or bare id; `video_reference` is accepted too.
    #[serde(alias = "video_reference")]
    pub video_url: String,
    /// Model variant; blank or absent means the default.
    #[serde(default)]
    pub model: Option<String>,
    /// Per-request limit for the model step; zero means the configured default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TranscribeBody {
    /// Convert to the orchestrator's request type.
    pub fn into_request(self) -> TranscriptionRequest {
        let mut request = TranscriptionRequest::new(self.video_url);
        if let Some(model) = self.model {
            request = request.with_model(model);
        }
        if let Some(secs) = self.timeout_secs.filter(|s| *s > 0) {
            request = request.with_deadline(Duration::from_secs(secs));
        }
        request
    }
}

/// One timed segment on the wire.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentBody {
    /// Start as `H:MM:SS`.
    pub start: String,
    /// End as `H:MM:SS`.
    pub end: String,
    /// Start in seconds.
    pub start_seconds: f64,
    /// End in seconds.
    pub end_seconds: f64,
    /// Segment text.
    pub text: String,
}

impl From<&Segment> for SegmentBody {
    fn from(s: &Segment) -> Self {
        Self {
            start: format_timestamp(s.start),
            end: format_timestamp(s.end),
            start_seconds: s.start,
            end_seconds: s.end,
            text: s.text.trim().to_string(),
        }
    }
}

/// Response body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TranscribeResponse {
    /// `model` or `captions`.
    pub source: Source,
    /// `ok`, `partial` or `failed`.
    pub status: Status,
    /// Model used; only for `source = model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Full text, empty on failure.
    pub transcript: String,
    /// Timed segments; empty when the text is untimed.
    pub segments: Vec<SegmentBody>,
    /// Diagnostic; present when `status` is not `ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl From<&TranscriptionResult> for TranscribeResponse {
    fn from(result: &TranscriptionResult) -> Self {
        Self {
            source: result.source,
            status: result.status,
            model: result.model.clone(),
            transcript: result.full_text(),
            segments: result.segments().iter().map(SegmentBody::from).collect(),
            error_detail: result.error_detail.clone(),
        }
    }
}
