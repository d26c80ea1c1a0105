//! # tubescribe-media
//!
//! Adapters behind the `tubescribe-core` collaborator traits:
//!
//! | Trait | Adapter | Backing |
//! |-------|---------|---------|
//! | `AudioSource` | [`YtDlpAudioSource`] | `yt-dlp`, `ffmpeg`, `ffprobe` |
//! | `SpeechEngine` | [`WhisperCliEngine`] | local `whisper` CLI |
//! | `SpeechEngine` | [`WhisperApiEngine`] | OpenAI-compatible HTTP API |
//! | `CaptionSource` | [`YoutubeCaptionSource`] | watch page caption tracks |
//!
//! [`mock`] holds scripted doubles for orchestrator and server tests.
//!
//! ## Crate Position
//!
//! Depends on: tubescribe-core, tubescribe-settings, tubescribe-telemetry.
//! Depended on by: tubescribe (binary), tubescribe-server (tests).

pub mod captions;
pub mod downloader;
pub mod mock;
pub mod process;
pub mod rate_limit;
mod verbose;
pub mod whisper_api;
pub mod whisper_cli;

pub use captions::YoutubeCaptionSource;
pub use downloader::YtDlpAudioSource;
pub use rate_limit::UsageLimiter;
pub use whisper_api::WhisperApiEngine;
pub use whisper_cli::WhisperCliEngine;
