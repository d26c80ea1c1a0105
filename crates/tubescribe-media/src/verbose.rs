//! Whisper `verbose_json` output, shared by the CLI and the hosted API.

use serde::Deserialize;
use tubescribe_core::{Segment, Transcript};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerboseTranscript {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerboseSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl VerboseTranscript {
    pub fn into_transcript(self) -> Transcript {
        let segments = self
            .segments
            .into_iter()
            .map(|s| Segment::new(s.start, s.end, s.text))
            .collect();
        Transcript::from_parts(&self.text, segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whisper_json_and_ignores_extra_fields() {
        let raw = r#"{
            "text": " Hello there. General Kenobi.",
            "language": "en",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.5, "text": " Hello there.", "tokens": [1, 2]},
                {"id": 1, "start": 1.5, "end": 3.25, "text": " General Kenobi.", "avg_logprob": -0.2}
            ]
        }"#;
        let parsed: VerboseTranscript = serde_json::from_str(raw).unwrap();
        let transcript = parsed.into_transcript();
        assert_eq!(transcript.segments().len(), 2);
        assert_eq!(transcript.segments()[1].end, 3.25);
        assert!(!transcript.is_empty());
    }

    #[test]
    fn missing_segments_falls_back_to_text() {
        let parsed: VerboseTranscript = serde_json::from_str(r#"{"text": "just text"}"#).unwrap();
        let transcript = parsed.into_transcript();
        assert!(transcript.segments().is_empty());
        assert_eq!(transcript.full_text(), "just text");
    }

    #[test]
    fn blank_output_is_empty() {
        let parsed: VerboseTranscript =
            serde_json::from_str(r#"{"text": "  ", "segments": []}"#).unwrap();
        assert!(parsed.into_transcript().is_empty());
    }
}
