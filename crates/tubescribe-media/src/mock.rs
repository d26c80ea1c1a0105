//! Scripted collaborators for deterministic tests without external tools.
//!
//! Each double replays its replies in order; once the script runs out the
//! last reply repeats. Call counts are tracked so tests can assert which
//! collaborators were touched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tubescribe_core::{
    AudioFile, AudioSource, CaptionError, CaptionSource, EngineError, Segment, SpeechEngine,
    Transcript, VideoReference,
};

/// One pre-programmed outcome.
#[derive(Clone, Debug)]
pub enum MockReply<T, E> {
    /// Succeed with the value.
    Ok(T),
    /// Fail with the error.
    Err(E),
    /// Wait, then yield the inner reply.
    Delay(Duration, Box<MockReply<T, E>>),
}

impl<T, E> MockReply<T, E> {
    /// `inner`, after sleeping for `delay`.
    pub fn delayed(delay: Duration, inner: Self) -> Self {
        Self::Delay(delay, Box::new(inner))
    }

    async fn resolve(self) -> Result<T, E> {
        let mut reply = self;
        loop {
            match reply {
                Self::Ok(value) => return Ok(value),
                Self::Err(err) => return Err(err),
                Self::Delay(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}

struct Script<T, E> {
    replies: Vec<MockReply<T, E>>,
    calls: AtomicUsize,
}

impl<T: Clone, E: Clone> Script<T, E> {
    fn new(replies: Vec<MockReply<T, E>>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Option<MockReply<T, E>> {
        let idx = self.calls.fetch_add(1, Ordering::Relaxed);
        let last = self.replies.len().checked_sub(1)?;
        Some(self.replies[idx.min(last)].clone())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

/// Speech engine double.
pub struct ScriptedEngine {
    script: Script<Transcript, EngineError>,
    models: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    /// Replay `replies` in order.
    pub fn new(replies: Vec<MockReply<Transcript, EngineError>>) -> Self {
        Self {
            script: Script::new(replies),
            models: Mutex::new(Vec::new()),
        }
    }

    /// Always transcribe to `text` as a single untimed blob.
    pub fn text(text: &str) -> Self {
        Self::new(vec![MockReply::Ok(Transcript::Blob(text.to_string()))])
    }

    /// Always transcribe to `segments`.
    pub fn segments(segments: Vec<Segment>) -> Self {
        Self::new(vec![MockReply::Ok(Transcript::Segments(segments))])
    }

    /// Always fail with `err`.
    pub fn failing(err: EngineError) -> Self {
        Self::new(vec![MockReply::Err(err)])
    }

    /// Number of `transcribe_audio` calls so far.
    pub fn call_count(&self) -> usize {
        self.script.calls()
    }

    /// Model names passed to each call, in order.
    pub fn models_seen(&self) -> Vec<String> {
        self.models.lock().clone()
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted-engine"
    }

    async fn transcribe_audio(
        &self,
        _audio: &AudioFile,
        model: &str,
    ) -> Result<Transcript, EngineError> {
        self.models.lock().push(model.to_string());
        match self.script.next() {
            Some(reply) => reply.resolve().await,
            None => Err(EngineError::Unavailable("no scripted reply".into())),
        }
    }
}

/// Caption source double.
pub struct ScriptedCaptions {
    script: Script<Transcript, CaptionError>,
}

impl ScriptedCaptions {
    /// Replay `replies` in order.
    pub fn new(replies: Vec<MockReply<Transcript, CaptionError>>) -> Self {
        Self {
            script: Script::new(replies),
        }
    }

    /// Always return `segments`.
    pub fn found(segments: Vec<Segment>) -> Self {
        Self::new(vec![MockReply::Ok(Transcript::Segments(segments))])
    }

    /// Never find captions.
    pub fn not_found() -> Self {
        Self::failing(CaptionError::NotFound)
    }

    /// Always fail with `err`.
    pub fn failing(err: CaptionError) -> Self {
        Self::new(vec![MockReply::Err(err)])
    }

    /// Number of `fetch_captions` calls so far.
    pub fn call_count(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl CaptionSource for ScriptedCaptions {
    fn name(&self) -> &str {
        "scripted-captions"
    }

    async fn fetch_captions(&self, _video: &VideoReference) -> Result<Transcript, CaptionError> {
        match self.script.next() {
            Some(reply) => reply.resolve().await,
            None => Err(CaptionError::Unavailable("no scripted reply".into())),
        }
    }
}

/// Shape of the audio a [`StaticAudioSource`] hands out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MockAudio {
    /// Reported duration.
    pub duration_seconds: f64,
    /// Clip length, when clipped.
    pub clipped_to: Option<f64>,
}

impl MockAudio {
    /// Unclipped audio of the given length.
    pub fn seconds(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            clipped_to: None,
        }
    }

    /// Audio cut at `duration_seconds`.
    pub fn clipped(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            clipped_to: Some(duration_seconds),
        }
    }
}

/// Audio source double. Produced files are never read by the scripted engine,
/// so their paths do not exist on disk.
pub struct StaticAudioSource {
    script: Script<MockAudio, EngineError>,
}

impl StaticAudioSource {
    /// Replay `replies` in order.
    pub fn new(replies: Vec<MockReply<MockAudio, EngineError>>) -> Self {
        Self {
            script: Script::new(replies),
        }
    }

    /// Always hand out a minute of unclipped audio.
    pub fn ok() -> Self {
        Self::new(vec![MockReply::Ok(MockAudio::seconds(60.0))])
    }

    /// Always hand out audio clipped at `seconds`.
    pub fn clipped(seconds: f64) -> Self {
        Self::new(vec![MockReply::Ok(MockAudio::clipped(seconds))])
    }

    /// Always fail with `err`.
    pub fn failing(err: EngineError) -> Self {
        Self::new(vec![MockReply::Err(err)])
    }

    /// Number of `fetch_audio` calls so far.
    pub fn call_count(&self) -> usize {
        self.script.calls()
    }
}

#[async_trait]
impl AudioSource for StaticAudioSource {
    fn name(&self) -> &str {
        "static-audio"
    }

    async fn fetch_audio(&self, video: &VideoReference) -> Result<AudioFile, EngineError> {
        let Some(reply) = self.script.next() else {
            return Err(EngineError::Unavailable("no scripted reply".into()));
        };
        let spec = reply.resolve().await?;
        let audio = AudioFile::new(
            format!("mock-audio/{}.mp3", video.id()),
            spec.duration_seconds,
            1024,
        );
        Ok(match spec.clipped_to {
            Some(secs) => audio.clipped_to(secs),
            None => audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn video() -> VideoReference {
        VideoReference::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn replies_in_order_then_repeat_last() {
        let engine = ScriptedEngine::new(vec![
            MockReply::Err(EngineError::EmptyOutput),
            MockReply::Ok(Transcript::Blob("second".into())),
        ]);
        let audio = AudioFile::new("x.mp3", 1.0, 1);

        assert_matches!(
            engine.transcribe_audio(&audio, "a").await,
            Err(EngineError::EmptyOutput)
        );
        assert_eq!(engine.transcribe_audio(&audio, "b").await.unwrap().full_text(), "second");
        assert_eq!(engine.transcribe_audio(&audio, "c").await.unwrap().full_text(), "second");
        assert_eq!(engine.call_count(), 3);
        assert_eq!(engine.models_seen(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_reply_waits() {
        let captions = ScriptedCaptions::new(vec![MockReply::delayed(
            Duration::from_secs(30),
            MockReply::Err(CaptionError::NotFound),
        )]);
        let started = tokio::time::Instant::now();
        let result = captions.fetch_captions(&video()).await;
        assert_eq!(result, Err(CaptionError::NotFound));
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn empty_script_is_an_error() {
        let source = StaticAudioSource::new(vec![]);
        assert_matches!(
            source.fetch_audio(&video()).await,
            Err(EngineError::Unavailable(_))
        );
    }

    #[tokio::test]
    async fn clipped_audio_is_marked() {
        let source = StaticAudioSource::clipped(600.0);
        let audio = source.fetch_audio(&video()).await.unwrap();
        assert_eq!(audio.clip(), Some(600.0));
        assert_eq!(source.call_count(), 1);
    }
}
