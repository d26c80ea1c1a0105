//! Local inference through the `whisper` command-line tool.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};
use tubescribe_core::{AudioFile, EngineError, ResultExt, SpeechEngine, Transcript};
use tubescribe_settings::WhisperCliSettings;

use crate::process::run_command;
use crate::verbose::VerboseTranscript;

/// Limit for one inference run; the orchestrator deadline usually fires first.
const RUN_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Runs `whisper <audio> --model <m> --output_format json` and reads the
/// JSON it writes. Each run loads the model, so concurrent runs are bounded.
pub struct WhisperCliEngine {
    binary: String,
    extra_args: Vec<String>,
    work_dir: Option<PathBuf>,
    permits: Arc<Semaphore>,
}

impl WhisperCliEngine {
    /// Engine running `settings.binary`, at most `max_concurrent` at a time.
    pub fn new(settings: &WhisperCliSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            extra_args: settings.extra_args.clone(),
            work_dir: None,
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
        }
    }

    /// Parent for the per-run output directories; the system temp dir when unset.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: Option<PathBuf>) -> Self {
        self.work_dir = work_dir;
        self
    }
}

#[async_trait]
impl SpeechEngine for WhisperCliEngine {
    fn name(&self) -> &str {
        "whisper-cli"
    }

    #[instrument(skip(self, audio))]
    async fn transcribe_audio(
        &self,
        audio: &AudioFile,
        model: &str,
    ) -> Result<Transcript, EngineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EngineError::Unavailable("whisper engine shut down".into()))?;

        let out_dir = match &self.work_dir {
            Some(parent) => tempfile::tempdir_in(parent),
            None => tempfile::tempdir(),
        }
        .inference("create output dir")?;
        let mut args: Vec<OsString> = vec![
            audio.path().into(),
            "--model".into(),
            model.into(),
            "--output_format".into(),
            "json".into(),
            "--output_dir".into(),
            out_dir.path().into(),
            "--fp16".into(),
            "False".into(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));

        debug!(binary = %self.binary, "starting whisper");
        let out = run_command(&self.binary, args, RUN_TIMEOUT)
            .await
            .map_err(|e| e.into_engine_error(EngineError::Inference))?;
        if !out.success() {
            return Err(EngineError::Inference(format!(
                "whisper exited with {}: {}",
                out.exit_code,
                out.stderr_tail()
            )));
        }

        let stem = audio
            .path()
            .file_stem()
            .ok_or_else(|| EngineError::Inference("audio path has no file name".into()))?;
        let json_path = out_dir.path().join(stem).with_extension("json");
        let raw = tokio::fs::read_to_string(&json_path)
            .await
            .inference("read whisper output")?;
        let parsed: VerboseTranscript =
            serde_json::from_str(&raw).inference("parse whisper output")?;

        let transcript = parsed.into_transcript();
        if transcript.is_empty() {
            return Err(EngineError::EmptyOutput);
        }
        info!(segments = transcript.segments().len(), "whisper transcription complete");
        Ok(transcript)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn fake_whisper(dir: &Path, json: &str) -> String {
        let script = format!(
            r#"#!/bin/sh
audio="$1"; shift
while [ $# -gt 0 ]; do
  case "$1" in --output_dir) out="$2"; echo "$2" > "$(dirname "$0")/outdir"; shift;; --model) echo "$2" > "$(dirname "$0")/model";; esac
  shift
done
stem=$(basename "$audio" .mp3)
cat > "$out/$stem.json" <<'JSON'
{json}
JSON
"#
        );
        let path = dir.join("whisper");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn engine(binary: String) -> WhisperCliEngine {
        WhisperCliEngine::new(&WhisperCliSettings {
            binary,
            ..WhisperCliSettings::default()
        })
    }

    fn audio_in(dir: &Path) -> AudioFile {
        let path = dir.join("audio.mp3");
        std::fs::write(&path, b"mp3").unwrap();
        AudioFile::new(path, 3.0, 3)
    }

    #[tokio::test]
    async fn reads_segments_from_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"text": " Hi. Bye.", "segments": [{"start": 0.0, "end": 1.0, "text": " Hi."}, {"start": 1.0, "end": 2.0, "text": " Bye."}]}"#;
        let engine = engine(fake_whisper(dir.path(), json));

        let transcript = engine
            .transcribe_audio(&audio_in(dir.path()), "base")
            .await
            .unwrap();
        assert_eq!(transcript.full_text(), "Hi. Bye.");
        assert_eq!(transcript.segments().len(), 2);

        let model = std::fs::read_to_string(dir.path().join("model")).unwrap();
        assert_eq!(model.trim(), "base");
    }

    #[tokio::test]
    async fn output_dir_lives_under_configured_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let json = r#"{"text": "hello", "segments": []}"#;
        let engine = engine(fake_whisper(dir.path(), json))
            .with_work_dir(Some(work.path().to_path_buf()));

        let transcript = engine
            .transcribe_audio(&audio_in(dir.path()), "tiny")
            .await
            .unwrap();
        assert_eq!(transcript.full_text(), "hello");

        let out_dir = std::fs::read_to_string(dir.path().join("outdir")).unwrap();
        assert!(Path::new(out_dir.trim()).starts_with(work.path()));
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn blank_output_is_empty_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(fake_whisper(dir.path(), r#"{"text": "", "segments": []}"#));

        let err = engine
            .transcribe_audio(&audio_in(dir.path()), "tiny")
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::EmptyOutput);
    }

    #[tokio::test]
    async fn nonzero_exit_is_inference_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whisper");
        std::fs::write(&path, "#!/bin/sh\necho 'RuntimeError: model not found' >&2\nexit 1\n")
            .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let engine = engine(path.to_string_lossy().into_owned());

        let err = engine
            .transcribe_audio(&audio_in(dir.path()), "huge")
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Inference(ref msg) if msg.contains("model not found"));
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine("tubescribe-missing-whisper".into());
        let err = engine
            .transcribe_audio(&audio_in(dir.path()), "tiny")
            .await
            .unwrap_err();
        assert_matches!(err, EngineError::Unavailable(_));
    }
}
