//! Core types for the tubescribe transcription service.
//!
//! # Architecture
//!
//! ```text
//! TranscriptionRequest → Orchestrator
//!     ├─ AudioSource::fetch_audio → SpeechEngine::transcribe_audio   (primary)
//!     └─ CaptionSource::fetch_captions                               (fallback)
//! → TranscriptionResult
//! ```
//!
//! ## Crate Position
//!
//! Standalone (no tubescribe crate dependencies).
//! Depended on by: every other tubescribe crate.

pub mod errors;
pub mod ports;
pub mod transcript;
pub mod video;

pub use errors::{CaptionError, EngineError, InvalidRequest, ResultExt};
pub use ports::{AudioFile, AudioSource, CaptionSource, SpeechEngine};
pub use transcript::{
    Segment, Source, Status, Transcript, TranscriptionRequest, TranscriptionResult,
    format_timestamp,
};
pub use video::VideoReference;
