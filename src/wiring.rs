//! Builds the orchestrator and its collaborators from settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tubescribe_core::SpeechEngine;
use tubescribe_engine::{Orchestrator, OrchestratorConfig};
use tubescribe_media::{
    WhisperApiEngine, WhisperCliEngine, YoutubeCaptionSource, YtDlpAudioSource,
};
use tubescribe_settings::{Backend, Settings};

pub fn build_orchestrator(settings: &Settings) -> Result<Orchestrator> {
    let audio = Arc::new(YtDlpAudioSource::new(
        settings.downloader.clone(),
        settings.transcription.max_audio_secs,
    ));

    let engine: Option<Arc<dyn SpeechEngine>> = match settings.transcription.backend {
        Backend::WhisperCli => {
            let work_dir = settings.downloader.work_dir.as_ref().map(PathBuf::from);
            Some(Arc::new(WhisperCliEngine::new(&settings.whisper_cli).with_work_dir(work_dir))
                as Arc<dyn SpeechEngine>)
        }
        Backend::WhisperApi if settings.whisper_api.api_key.trim().is_empty() => {
            warn!("whisper_api backend selected but no API key set; captions only");
            None
        }
        Backend::WhisperApi => Some(Arc::new(
            WhisperApiEngine::new(&settings.whisper_api).context("whisper API engine")?,
        ) as Arc<dyn SpeechEngine>),
    };

    let captions = Arc::new(
        YoutubeCaptionSource::new(&settings.captions).context("caption source")?,
    );

    let orchestrator = Orchestrator::new(
        audio,
        engine,
        captions,
        OrchestratorConfig::from_settings(settings),
    );
    info!(
        backend = ?settings.transcription.backend,
        model = %orchestrator.config().default_model,
        model_path = orchestrator.model_path_active(),
        "orchestrator ready"
    );
    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_the_local_cli() {
        let orch = build_orchestrator(&Settings::default()).unwrap();
        assert!(orch.model_path_active());
        assert_eq!(orch.config().default_model, "tiny");
    }

    #[test]
    fn hosted_backend_without_key_is_captions_only() {
        let mut settings = Settings::default();
        settings.transcription.backend = Backend::WhisperApi;
        let orch = build_orchestrator(&settings).unwrap();
        assert!(!orch.model_path_active());
    }

    #[test]
    fn hosted_backend_with_key_uses_api_model() {
        let mut settings = Settings::default();
        settings.transcription.backend = Backend::WhisperApi;
        settings.whisper_api.api_key = "gsk_test".into();
        let orch = build_orchestrator(&settings).unwrap();
        assert!(orch.model_path_active());
        assert_eq!(orch.config().default_model, "whisper-large-v3-turbo");
    }

    #[test]
    fn disabled_model_flag_is_respected() {
        let mut settings = Settings::default();
        settings.transcription.model_enabled = false;
        let orch = build_orchestrator(&settings).unwrap();
        assert!(!orch.model_path_active());
    }
}
