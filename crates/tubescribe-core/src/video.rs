//! Parsing of user-supplied video references (bare ids and YouTube URLs).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::InvalidRequest;

/// An 11-character id preceded by `v=` or a path separator.
static ID_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("static regex"));

static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("static regex"));

/// A validated reference to a single YouTube video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference {
    raw: String,
    id: String,
}

impl VideoReference {
    /// Validate `input` and extract its video id.
    ///
    /// Accepts a bare id (`dQw4w9WgXcQ`) or any URL carrying the id after
    /// `v=` or a `/` (watch, `youtu.be`, shorts and embed links).
    pub fn parse(input: &str) -> Result<Self, InvalidRequest> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(InvalidRequest::EmptyReference);
        }

        let id = if BARE_ID.is_match(raw) {
            raw.to_string()
        } else {
            ID_IN_URL
                .captures(raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| InvalidRequest::UnrecognizedReference(raw.to_string()))?
        };

        Ok(Self {
            raw: raw.to_string(),
            id,
        })
    }

    /// The 11-character video id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The reference exactly as supplied (trimmed).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// URL handed to the downloader. Bare ids are expanded to a watch URL.
    pub fn url(&self) -> String {
        if self.raw.contains("://") {
            self.raw.clone()
        } else {
            format!("https://www.youtube.com/watch?v={}", self.id)
        }
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VideoReference {
    type Err = InvalidRequest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_watch_url() {
        let v = VideoReference::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap();
        assert_eq!(v.id(), "dQw4w9WgXcQ");
        assert_eq!(v.url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s");
    }

    #[test]
    fn parses_short_links() {
        for input in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1",
        ] {
            let v = VideoReference::parse(input).unwrap();
            assert_eq!(v.id(), "dQw4w9WgXcQ", "input: {input}");
        }
    }

    #[test]
    fn bare_id_expands_to_watch_url() {
        let v: VideoReference = "dQw4w9WgXcQ".parse().unwrap();
        assert_eq!(v.raw(), "dQw4w9WgXcQ");
        assert_eq!(v.url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let v = VideoReference::parse("  https://youtu.be/dQw4w9WgXcQ \n").unwrap();
        assert_eq!(v.raw(), "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(v.to_string(), "https://youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn empty_reference_rejected() {
        assert_matches!(VideoReference::parse(""), Err(InvalidRequest::EmptyReference));
        assert_matches!(VideoReference::parse("   "), Err(InvalidRequest::EmptyReference));
    }

    #[test]
    fn unrecognized_reference_rejected() {
        assert_matches!(
            VideoReference::parse("not a video"),
            Err(InvalidRequest::UnrecognizedReference(s)) if s == "not a video"
        );
        assert_matches!(
            VideoReference::parse("https://example.com/short"),
            Err(InvalidRequest::UnrecognizedReference(_))
        );
    }
}
