//! Audio acquisition through `yt-dlp`, converted to MP3 with `ffmpeg`.
//!
//! Each call works in its own temp directory. The directory travels with the
//! returned [`AudioFile`] and is removed when that value is dropped, whether
//! the transcription succeeded or not.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};
use tubescribe_core::{AudioFile, AudioSource, EngineError, ResultExt, VideoReference};
use tubescribe_settings::DownloaderSettings;

use crate::process::run_command;

const SOURCE_STEM: &str = "source";
const OUTPUT_NAME: &str = "audio.mp3";

/// Limit for any single tool invocation.
const TOOL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Converted audio this close to the cap counts as clipped.
const CLIP_TOLERANCE_SECS: f64 = 1.0;

/// Fetches audio with `yt-dlp` and normalizes it to MP3 with `ffmpeg`.
pub struct YtDlpAudioSource {
    settings: DownloaderSettings,
    max_audio_secs: Option<u64>,
}

impl YtDlpAudioSource {
    /// Source using the configured tools. Audio longer than `max_audio_secs`
    /// is cut at that length.
    pub fn new(settings: DownloaderSettings, max_audio_secs: Option<u64>) -> Self {
        Self {
            settings,
            max_audio_secs,
        }
    }

    fn workdir(&self) -> Result<TempDir, EngineError> {
        let builder = {
            let mut b = tempfile::Builder::new();
            let _ = b.prefix("tubescribe-");
            b
        };
        let dir = match &self.settings.work_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.download("create work dir")
    }

    async fn download(&self, video: &VideoReference, dir: &Path) -> Result<PathBuf, EngineError> {
        let template = dir.join(format!("{SOURCE_STEM}.%(ext)s"));
        let socket_timeout = self.settings.socket_timeout_secs.to_string();
        let url = video.url();
        let args: Vec<&std::ffi::OsStr> = vec![
            "-f".as_ref(),
            self.settings.format.as_ref(),
            "--no-playlist".as_ref(),
            "--quiet".as_ref(),
            "--no-warnings".as_ref(),
            "--socket-timeout".as_ref(),
            socket_timeout.as_ref(),
            "-o".as_ref(),
            template.as_os_str(),
            url.as_ref(),
        ];

        let out = run_command(&self.settings.yt_dlp, args, TOOL_TIMEOUT)
            .await
            .map_err(|e| e.into_engine_error(EngineError::Download))?;
        if !out.success() {
            return Err(EngineError::Download(out.stderr_tail()));
        }

        find_with_stem(dir, SOURCE_STEM)
            .await?
            .ok_or_else(|| EngineError::Download("yt-dlp produced no file".into()))
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        clip: Option<u64>,
    ) -> Result<(), EngineError> {
        let mut args: Vec<std::ffi::OsString> = vec!["-y".into(), "-i".into(), input.into()];
        args.extend(["-vn", "-acodec", "libmp3lame", "-q:a", "4"].map(Into::into));
        if let Some(secs) = clip {
            args.extend(["-t".into(), secs.to_string().into()]);
        }
        args.push(output.into());

        let out = run_command(&self.settings.ffmpeg, args, TOOL_TIMEOUT)
            .await
            .map_err(|e| e.into_engine_error(EngineError::Decode))?;
        if !out.success() {
            return Err(EngineError::Decode(format!(
                "ffmpeg conversion failed: {}",
                out.stderr_tail()
            )));
        }
        Ok(())
    }

    /// Duration in seconds, `None` when it cannot be determined.
    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let args: [&std::ffi::OsStr; 7] = [
            "-v".as_ref(),
            "error".as_ref(),
            "-show_entries".as_ref(),
            "format=duration".as_ref(),
            "-of".as_ref(),
            "default=noprint_wrappers=1:nokey=1".as_ref(),
            path.as_os_str(),
        ];
        match run_command(&self.settings.ffprobe, args, Duration::from_secs(60)).await {
            Ok(out) if out.success() => parse_duration(&out.stdout),
            Ok(out) => {
                debug!(stderr = %out.stderr_tail(), "ffprobe failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "ffprobe unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl AudioSource for YtDlpAudioSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self, video), fields(video_id = %video.id()))]
    async fn fetch_audio(&self, video: &VideoReference) -> Result<AudioFile, EngineError> {
        let dir = self.workdir()?;
        let source = self.download(video, dir.path()).await?;
        let probed = self.probe_duration(&source).await;

        // An unknown duration cannot prove the audio fits under the cap.
        let cap = match (self.max_audio_secs, probed) {
            (Some(max), Some(d)) if d <= max as f64 => None,
            (max, _) => max,
        };

        let output = dir.path().join(OUTPUT_NAME);
        self.convert(&source, &output, cap).await?;

        let size = match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => {
                return Err(EngineError::Decode(
                    "MP3 conversion failed: output file missing or empty".into(),
                ));
            }
        };

        let (duration, clip) = match (cap, probed) {
            (Some(max), Some(_)) => (max as f64, Some(max as f64)),
            (Some(max), None) => match self.probe_duration(&output).await {
                Some(d) if d < max as f64 - CLIP_TOLERANCE_SECS => (d, None),
                _ => (max as f64, Some(max as f64)),
            },
            (None, Some(d)) => (d, None),
            (None, None) => {
                let d = self.probe_duration(&output).await.unwrap_or_else(|| {
                    warn!("audio duration unknown");
                    0.0
                });
                (d, None)
            }
        };
        info!(duration, size, clipped = clip.is_some(), "audio ready");

        let mut audio = AudioFile::new(output, duration, size).in_workdir(dir);
        if let Some(max) = clip {
            audio = audio.clipped_to(max);
        }
        Ok(audio)
    }
}

/// Parse ffprobe's bare duration output.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

async fn find_with_stem(dir: &Path, stem: &str) -> Result<Option<PathBuf>, EngineError> {
    let mut entries = tokio::fs::read_dir(dir).await.download("read work dir")?;
    while let Some(entry) = entries.next_entry().await.download("read work dir")? {
        let path = entry.path();
        if path.file_stem().is_some_and(|s| s == stem) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
