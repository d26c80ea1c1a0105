//! Platform caption fetching.
//!
//! The watch page embeds the player response, which lists caption tracks with
//! a `baseUrl` pointing at timed-text XML. We pick a track, fetch it and turn
//! each `<text start dur>` cue into a segment.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use tubescribe_core::{
    CaptionError, CaptionSource, ResultExt, Segment, Transcript, VideoReference,
};
use tubescribe_settings::CaptionSettings;

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";
const CAPTIONS_KEY: &str = "\"captions\":";

static PLAYABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""playabilityStatus":\{"status":"([A-Z_]+)"(?:,"reason":"([^"]*)")?"#)
        .expect("valid playability regex")
});
static CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text([^>]*)>(.*?)</text>").expect("valid cue regex"));
static START_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"start="([0-9.]+)""#).expect("valid start regex"));
static DUR_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"dur="([0-9.]+)""#).expect("valid dur regex"));
static INNER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|amp|lt|gt|quot|apos);").expect("valid entity regex")
});

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, lang: &str) -> bool {
        self.language_code.eq_ignore_ascii_case(lang)
            || self
                .language_code
                .to_ascii_lowercase()
                .starts_with(&format!("{}-", lang.to_ascii_lowercase()))
    }
}

/// Caption source reading the YouTube watch page and timed-text API.
pub struct YoutubeCaptionSource {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
}

impl YoutubeCaptionSource {
    /// Source for `settings.base_url`, preferring `settings.languages` in order.
    pub fn new(settings: &CaptionSettings) -> Result<Self, CaptionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("tubescribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .captions_unavailable("http client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            languages: settings.languages.clone(),
        })
    }

    async fn get_text(&self, url: &str, what: &str) -> Result<String, CaptionError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .captions_unavailable(what)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::Unavailable(format!("{what}: status {status}")));
        }
        response.text().await.captions_unavailable(what)
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            url.to_string()
        }
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionSource {
    fn name(&self) -> &str {
        "youtube-captions"
    }

    #[instrument(skip(self, video), fields(video_id = %video.id()))]
    async fn fetch_captions(&self, video: &VideoReference) -> Result<Transcript, CaptionError> {
        let page_url = format!("{}/watch?v={}", self.base_url, video.id());
        let page = self.get_text(&page_url, "watch page").await?;

        check_playability(&page)?;
        let tracks = extract_tracks(&page);
        if tracks.is_empty() && captions_disabled(&page) {
            return Err(CaptionError::Disabled);
        }
        let track = select_track(&tracks, &self.languages).ok_or(CaptionError::NotFound)?;
        debug!(
            language = %track.language_code,
            generated = track.is_generated(),
            "caption track selected"
        );

        let xml = self
            .get_text(&self.absolute(&track.base_url), "timed text")
            .await?;
        let segments = parse_timed_text(&xml);
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let transcript = Transcript::from_parts(&text, segments);
        if transcript.is_empty() {
            return Err(CaptionError::NotFound);
        }
        info!(segments = transcript.segments().len(), "captions fetched");
        Ok(transcript)
    }
}

/// Reject pages whose player reports the video as unplayable.
fn check_playability(page: &str) -> Result<(), CaptionError> {
    let Some(caps) = PLAYABILITY.captures(page) else {
        return Ok(());
    };
    match &caps[1] {
        "OK" => Ok(()),
        status => {
            let reason = caps.get(2).map_or("", |m| m.as_str());
            Err(CaptionError::Unavailable(if reason.is_empty() {
                format!("video {}", status.to_ascii_lowercase())
            } else {
                format!("video {}: {reason}", status.to_ascii_lowercase())
            }))
        }
    }
}

/// A player response without any caption renderer means the uploader
/// turned captions off.
fn captions_disabled(page: &str) -> bool {
    PLAYABILITY.is_match(page) && !page.contains(CAPTIONS_KEY)
}

fn extract_tracks(page: &str) -> Vec<CaptionTrack> {
    let Some(idx) = page.find(CAPTION_TRACKS_KEY) else {
        return Vec::new();
    };
    let rest = &page[idx + CAPTION_TRACKS_KEY.len()..];
    serde_json::Deserializer::from_str(rest)
        .into_iter::<Vec<CaptionTrack>>()
        .next()
        .and_then(Result::ok)
        .unwrap_or_default()
}

/// First preferred language wins; within a language, manual tracks beat
/// generated ones. With no language match, the first track is used.
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    for lang in languages {
        let mut candidates = tracks.iter().filter(|t| t.matches_language(lang));
        let manual = candidates.clone().find(|t| !t.is_generated());
        if let Some(track) = manual.or_else(|| candidates.next()) {
            return Some(track);
        }
    }
    tracks.first()
}

fn parse_timed_text(xml: &str) -> Vec<Segment> {
    CUE.captures_iter(xml)
        .filter_map(|caps| {
            let attrs = &caps[1];
            let start: f64 = START_ATTR.captures(attrs)?[1].parse().ok()?;
            let dur: f64 = DUR_ATTR
                .captures(attrs)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(0.0);
            let text = decode_entities(&INNER_TAG.replace_all(&caps[2], ""));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then(|| Segment::new(start, start + dur, text))
        })
        .collect()
}

fn decode_entities(s: &str) -> String {
    // Timed text is often double-escaped (`&amp;#39;`), so decode twice.
    let once = decode_entities_once(s);
    if once.contains('&') {
        decode_entities_once(&once)
    } else {
        once
    }
}

fn decode_entities_once(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity[1..].parse().ok()
                    };
                    code.and_then(char::from_u32)
                        .map_or_else(|| caps[0].to_string(), String::from)
                }
            }
        })
        .into_owned()
}
