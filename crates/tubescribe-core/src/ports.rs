//! Collaborator traits the orchestrator depends on.
//!
//! Implementations live in `tubescribe-media`; the orchestrator only sees
//! these seams, which keeps it testable with scripted doubles.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::errors::{CaptionError, EngineError};
use crate::transcript::Transcript;
use crate::video::VideoReference;

/// A local audio file ready for the speech engine.
///
/// When the file lives in a per-request temp directory, the directory is
/// owned here and removed when the `AudioFile` is dropped.
#[derive(Debug)]
pub struct AudioFile {
    path: PathBuf,
    duration_seconds: f64,
    size_bytes: u64,
    clipped_to: Option<f64>,
    _workdir: Option<TempDir>,
}

impl AudioFile {
    /// Audio at `path` with a probed duration and on-disk size.
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            duration_seconds,
            size_bytes,
            clipped_to: None,
            _workdir: None,
        }
    }

    /// Mark the audio as cut short at `seconds`.
    #[must_use]
    pub fn clipped_to(mut self, seconds: f64) -> Self {
        self.clipped_to = Some(seconds);
        self
    }

    /// Tie the lifetime of `dir` to this file.
    #[must_use]
    pub fn in_workdir(mut self, dir: TempDir) -> Self {
        self._workdir = Some(dir);
        self
    }

    /// Location of the audio file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duration in seconds as probed; 0.0 when unknown.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// File size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Clip length in seconds when the source was longer than allowed.
    pub fn clip(&self) -> Option<f64> {
        self.clipped_to
    }
}

/// Resolves a video reference to local audio.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Short adapter name for logs.
    fn name(&self) -> &str;

    /// Download and convert the audio for `video`.
    async fn fetch_audio(&self, video: &VideoReference) -> Result<AudioFile, EngineError>;
}

/// Speech-to-text model: audio in, text out.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Transcribe `audio` with the named model variant.
    ///
    /// Empty output is reported as [`EngineError::EmptyOutput`], not as an
    /// empty transcript.
    async fn transcribe_audio(
        &self,
        audio: &AudioFile,
        model: &str,
    ) -> Result<Transcript, EngineError>;
}

/// Platform-hosted captions for a video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Short adapter name for logs.
    fn name(&self) -> &str;

    /// Fetch the best caption track for `video`.
    async fn fetch_captions(&self, video: &VideoReference) -> Result<Transcript, CaptionError>;
}
