//! # tubescribe-engine
//!
//! The [`Orchestrator`] turns a `TranscriptionRequest` into a
//! `TranscriptionResult`. It owns the fallback policy and nothing else:
//! downloading, inference and caption fetching happen behind the
//! `tubescribe-core` traits.
//!
//! ## Crate Position
//!
//! Depends on: tubescribe-core, tubescribe-settings, tubescribe-telemetry.
//! Depended on by: tubescribe-server, tubescribe (binary).

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
