//! # tubescribe-server
//!
//! axum HTTP layer over the transcription orchestrator.
//!
//! | Route | Auth | Handler |
//! |-------|------|---------|
//! | `POST /transcribe` | bearer token | [`handlers::transcribe`] |
//! | `GET /health` | none | [`handlers::health`] |
//! | `GET /metrics` | none | [`handlers::metrics`] |
//!
//! ## Crate Position
//!
//! Depends on: tubescribe-core, tubescribe-engine, tubescribe-telemetry.
//! Depended on by: tubescribe (binary).

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod request_id;
pub mod server;

pub use auth::ApiToken;
pub use server::{AppState, ServerConfig, ServerHandle, build_router, start};
