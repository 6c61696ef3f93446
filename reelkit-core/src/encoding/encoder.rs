//! Encoding engine abstraction for both production and simulation modes
//!
//! The external encoder is wrapped in an [`Encoder`] capability object that is
//! constructed once at startup and injected into the orchestrator. Production
//! uses the `ffmpeg` binary as a child process; the simulation implementation
//! fabricates renditions so pipeline tests never need a real encoder.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::presets::{QualityLevel, QualityPreset};
use crate::config::TranscodingConfig;

/// Errors from a single rendition or thumbnail encode
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Encoder spawn failed: {reason}")]
    SpawnFailed { reason: String },

    #[error("Encoder process failed (exit {exit_code:?}): {stderr}")]
    EngineFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Encode timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Output file missing or truncated: {path}")]
    InvalidOutput { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress notification callback, invoked with percent complete (0-100).
///
/// Notifications are best-effort and must never be used as a
/// synchronization point.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// One fully encoded output file at a specific quality tier
#[derive(Debug, Clone)]
pub struct EncodedRendition {
    pub level: QualityLevel,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Abstraction over the external encoding engine.
///
/// A rendition encode is binary done/failed; there is no partial-success
/// state. Thumbnail extraction is independent of rendition success.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encode one rendition of `input` using `preset`.
    ///
    /// # Errors
    /// - `EncodeError::SpawnFailed` - Engine binary could not be started
    /// - `EncodeError::EngineFailed` - Engine exited with an error
    /// - `EncodeError::Timeout` - Encode exceeded the configured timeout
    /// - `EncodeError::InvalidOutput` - Output file missing or truncated
    async fn encode_rendition(
        &self,
        input: &Path,
        output: &Path,
        preset: &QualityPreset,
        progress: Option<ProgressFn>,
    ) -> Result<EncodedRendition, EncodeError>;

    /// Extract a single still frame at `offset` into a fixed-size image.
    /// Returns the thumbnail file size in bytes.
    ///
    /// # Errors
    /// Same failure modes as `encode_rendition`; a thumbnail failure never
    /// affects rendition success.
    async fn extract_thumbnail(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
    ) -> Result<u64, EncodeError>;

    /// Check if the encoding engine is available and properly configured
    fn is_available(&self) -> bool;
}

/// Production encoder invoking the `ffmpeg` binary per preset
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    config: TranscodingConfig,
}

impl FfmpegEncoder {
    /// Create a new encoder with optional custom binary location
    pub fn new(ffmpeg_path: Option<PathBuf>, config: TranscodingConfig) -> Self {
        let ffmpeg_path = ffmpeg_path.unwrap_or_else(|| PathBuf::from("ffmpeg"));
        let ffprobe_path = ffmpeg_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.join("ffprobe"))
            .unwrap_or_else(|| PathBuf::from("ffprobe"));

        Self {
            ffmpeg_path,
            ffprobe_path,
            config,
        }
    }

    /// Probe clip duration for progress calculation. Best effort: without a
    /// duration, progress callbacks are skipped but the encode proceeds.
    async fn probe_duration(&self, input: &Path) -> Option<Duration> {
        let output = Command::new(&self.ffprobe_path)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(input)
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let seconds: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
        (seconds > 0.0).then(|| Duration::from_secs_f64(seconds))
    }

    fn build_rendition_command(
        &self,
        input: &Path,
        output: &Path,
        preset: &QualityPreset,
    ) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);

        cmd.arg("-y").arg("-i").arg(input);

        // Rendition geometry and rate control
        cmd.arg("-vf")
            .arg(format!("scale={}", preset.resolution()))
            .arg("-b:v")
            .arg(format!("{}k", preset.video_bitrate_kbps))
            .arg("-maxrate")
            .arg(format!("{}k", preset.video_bitrate_kbps))
            .arg("-bufsize")
            .arg(format!("{}k", preset.video_bitrate_kbps * 2))
            .arg("-crf")
            .arg(preset.crf.to_string());

        // H.264 main profile, level 4.0, AAC audio, 4:2:0 chroma
        cmd.arg("-c:v")
            .arg("libx264")
            .arg("-profile:v")
            .arg("main")
            .arg("-level")
            .arg("4.0")
            .arg("-preset")
            .arg(self.config.encoder_speed_preset)
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg("-c:a")
            .arg("aac")
            .arg("-b:a")
            .arg(format!("{}k", preset.audio_bitrate_kbps));

        // Closed GOP and progressive-start metadata relocation
        cmd.arg("-g")
            .arg(self.config.gop_size.to_string())
            .arg("-keyint_min")
            .arg(self.config.min_keyframe_interval.to_string())
            .arg("-movflags")
            .arg("+faststart");

        // Machine-readable progress on stdout
        cmd.arg("-nostats").arg("-progress").arg("pipe:1");

        cmd.arg(output);

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        cmd
    }

    async fn run_encode(
        &self,
        mut cmd: Command,
        output_path: &Path,
        clip_duration: Option<Duration>,
        progress: Option<ProgressFn>,
    ) -> Result<u64, EncodeError> {
        // If the timeout drops the future mid-encode, the child must not
        // linger and keep writing a half-finished output
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| EncodeError::SpawnFailed {
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drained concurrently with the stdout loop: the engine is chatty on
        // stderr, and a full pipe buffer would block it until the timeout
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            buf
        });

        let encode = async {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let (Some(callback), Some(total)) = (&progress, clip_duration) {
                        // ffmpeg reports out_time_ms in microseconds
                        if let Some(value) = line.strip_prefix("out_time_ms=") {
                            if let Ok(us) = value.trim().parse::<u64>() {
                                let percent =
                                    (us as f64 / total.as_micros() as f64 * 100.0).clamp(0.0, 100.0);
                                callback(percent);
                            }
                        } else if line.trim() == "progress=end" {
                            callback(100.0);
                        }
                    }
                }
            }

            let status = child.wait().await.map_err(|e| EncodeError::EngineFailed {
                exit_code: None,
                stderr: e.to_string(),
            })?;
            let stderr_bytes = stderr_task.await.unwrap_or_default();
            Ok::<_, EncodeError>((status, stderr_bytes))
        };

        let timeout = self.config.encode_timeout;
        let (status, stderr_bytes) = match tokio::time::timeout(timeout, encode).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(EncodeError::Timeout {
                    seconds: timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();
            return Err(EncodeError::EngineFailed {
                exit_code: status.code(),
                stderr,
            });
        }

        let size = tokio::fs::metadata(output_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        // A playable output is never this small; treat it as corrupt
        if size < 100 {
            return Err(EncodeError::InvalidOutput {
                path: output_path.to_path_buf(),
            });
        }

        Ok(size)
    }

    /// Verify the encoder installation by running the version command
    fn verify_installation(&self) -> bool {
        std::process::Command::new(&self.ffmpeg_path)
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode_rendition(
        &self,
        input: &Path,
        output: &Path,
        preset: &QualityPreset,
        progress: Option<ProgressFn>,
    ) -> Result<EncodedRendition, EncodeError> {
        tracing::info!(
            "Encoding {} rendition: {} -> {}",
            preset.level,
            input.display(),
            output.display()
        );

        let clip_duration = self.probe_duration(input).await;
        let cmd = self.build_rendition_command(input, output, preset);
        let size_bytes = self.run_encode(cmd, output, clip_duration, progress).await?;

        tracing::debug!(
            "Encoded {} rendition: {} bytes",
            preset.level,
            size_bytes
        );

        Ok(EncodedRendition {
            level: preset.level,
            path: output.to_path_buf(),
            size_bytes,
        })
    }

    async fn extract_thumbnail(
        &self,
        input: &Path,
        output: &Path,
        offset: Duration,
    ) -> Result<u64, EncodeError> {
        let mut cmd = Command::new(&self.ffmpeg_path);

        cmd.arg("-y")
            .arg("-ss")
            .arg(format!("{:.3}", offset.as_secs_f64()))
            .arg("-i")
            .arg(input)
            .arg("-frames:v")
            .arg("1")
            .arg("-vf")
            .arg(format!(
                "scale={}x{}",
                self.config.thumbnail_width, self.config.thumbnail_height
            ))
            .arg(output);

        cmd.stdout(Stdio::null())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        self.run_encode(cmd, output, None, None).await
    }

    fn is_available(&self) -> bool {
        self.verify_installation()
    }
}

/// Simulation encoder for testing the pipeline without a real engine.
///
/// Fabricates rendition files whose sizes follow the preset bitrate ladder,
/// with optional per-preset failure injection.
pub struct SimulationEncoder {
    /// Fraction of the input size produced for the high rendition; lower
    /// tiers scale down by bitrate share
    size_ratio: f64,
    /// Preset that should fail, for failure-path tests
    fail_on: Option<QualityLevel>,
    /// Fail thumbnail extraction while renditions keep succeeding
    fail_thumbnail: bool,
    is_available: bool,
}

impl SimulationEncoder {
    pub fn new() -> Self {
        Self {
            size_ratio: 0.5,
            fail_on: None,
            fail_thumbnail: false,
            is_available: true,
        }
    }

    /// Configure the high-rendition size as a fraction of the input size
    pub fn with_size_ratio(mut self, ratio: f64) -> Self {
        self.size_ratio = ratio.clamp(0.01, 1.0);
        self
    }

    /// Inject a failure for one preset
    pub fn failing_on(mut self, level: QualityLevel) -> Self {
        self.fail_on = Some(level);
        self
    }

    /// Inject a thumbnail extraction failure
    pub fn failing_thumbnail(mut self) -> Self {
        self.fail_thumbnail = true;
        self
    }

    /// Simulate the engine being unavailable
    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}

impl Default for SimulationEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Encoder for SimulationEncoder {
    async fn encode_rendition(
        &self,
        input: &Path,
        output: &Path,
        preset: &QualityPreset,
        progress: Option<ProgressFn>,
    ) -> Result<EncodedRendition, EncodeError> {
        if !self.is_available {
            return Err(EncodeError::SpawnFailed {
                reason: "encoder not available in simulation".to_string(),
            });
        }

        if self.fail_on == Some(preset.level) {
            return Err(EncodeError::EngineFailed {
                exit_code: Some(1),
                stderr: format!("simulated failure for {} preset", preset.level),
            });
        }

        let input_size = tokio::fs::metadata(input).await?.len();

        // Scale output size by the tier's share of the top bitrate
        let bitrate_share = preset.video_bitrate_kbps as f64
            / super::presets::preset_for(QualityLevel::High).video_bitrate_kbps as f64;
        let size_bytes = ((input_size as f64 * self.size_ratio * bitrate_share) as u64).max(256);

        if let Some(callback) = &progress {
            callback(0.0);
            callback(50.0);
        }

        tokio::fs::write(output, vec![0u8; size_bytes as usize]).await?;

        if let Some(callback) = &progress {
            callback(100.0);
        }

        Ok(EncodedRendition {
            level: preset.level,
            path: output.to_path_buf(),
            size_bytes,
        })
    }

    async fn extract_thumbnail(
        &self,
        input: &Path,
        output: &Path,
        _offset: Duration,
    ) -> Result<u64, EncodeError> {
        if !self.is_available {
            return Err(EncodeError::SpawnFailed {
                reason: "encoder not available in simulation".to_string(),
            });
        }

        if self.fail_thumbnail {
            return Err(EncodeError::EngineFailed {
                exit_code: Some(1),
                stderr: "simulated thumbnail failure".to_string(),
            });
        }

        // Fail like the real engine would on a missing source
        tokio::fs::metadata(input).await?;

        let stub = vec![0u8; 1024];
        tokio::fs::write(output, &stub).await?;
        Ok(stub.len() as u64)
    }

    fn is_available(&self) -> bool {
        self.is_available
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::tempdir;

    use super::*;
    use crate::encoding::presets::{all_presets, preset_for};

    #[tokio::test]
    async fn test_simulation_encoder_produces_smaller_outputs() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("input.mp4");
        tokio::fs::write(&input, vec![0u8; 1024 * 1024]).await.unwrap();

        let encoder = SimulationEncoder::new();

        for preset in all_presets() {
            let output = temp_dir
                .path()
                .join(format!("out{}.mp4", preset.level.suffix()));
            let rendition = encoder
                .encode_rendition(&input, &output, preset, None)
                .await
                .unwrap();

            assert_eq!(rendition.level, preset.level);
            assert!(rendition.size_bytes < 1024 * 1024);
            assert!(output.exists());
        }
    }

    #[tokio::test]
    async fn test_simulation_encoder_failure_injection() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("input.mp4");
        tokio::fs::write(&input, vec![0u8; 4096]).await.unwrap();

        let encoder = SimulationEncoder::new().failing_on(QualityLevel::Medium);
        let output = temp_dir.path().join("out.mp4");

        let high = encoder
            .encode_rendition(&input, &output, preset_for(QualityLevel::High), None)
            .await;
        assert!(high.is_ok());

        let medium = encoder
            .encode_rendition(&input, &output, preset_for(QualityLevel::Medium), None)
            .await;
        assert!(matches!(medium, Err(EncodeError::EngineFailed { .. })));
    }

    #[tokio::test]
    async fn test_simulation_encoder_progress_reaches_completion() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("input.mp4");
        tokio::fs::write(&input, vec![0u8; 4096]).await.unwrap();

        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressFn = Arc::new(move |percent| {
            sink.lock().unwrap().push(percent);
        });

        let encoder = SimulationEncoder::new();
        let output = temp_dir.path().join("out.mp4");
        encoder
            .encode_rendition(&input, &output, preset_for(QualityLevel::Low), Some(callback))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&100.0));
        assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
    }

    #[tokio::test]
    async fn test_simulation_encoder_unavailable() {
        let temp_dir = tempdir().unwrap();
        let input = temp_dir.path().join("input.mp4");
        tokio::fs::write(&input, b"data").await.unwrap();

        let encoder = SimulationEncoder::new().unavailable();
        assert!(!encoder.is_available());

        let result = encoder
            .encode_rendition(
                &input,
                &temp_dir.path().join("out.mp4"),
                preset_for(QualityLevel::Low),
                None,
            )
            .await;
        assert!(matches!(result, Err(EncodeError::SpawnFailed { .. })));
    }

    #[tokio::test]
    async fn test_thumbnail_requires_source_file() {
        let temp_dir = tempdir().unwrap();
        let encoder = SimulationEncoder::new();

        let missing = temp_dir.path().join("missing.mp4");
        let result = encoder
            .extract_thumbnail(
                &missing,
                &temp_dir.path().join("thumb.jpg"),
                Duration::from_secs(1),
            )
            .await;
        assert!(matches!(result, Err(EncodeError::Io(_))));
    }

    #[test]
    fn test_ffmpeg_rendition_command_arguments() {
        let encoder = FfmpegEncoder::new(None, TranscodingConfig::default());
        let preset = preset_for(QualityLevel::Medium);

        let cmd = encoder.build_rendition_command(
            Path::new("in.mp4"),
            Path::new("out_medium.mp4"),
            preset,
        );
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.contains(&"scale=720x1280".to_string()));
        assert!(args.contains(&"1200k".to_string()));
        assert!(args.contains(&"80k".to_string()));
        assert!(args.contains(&"24".to_string()));
        assert!(args.contains(&"main".to_string()));
        assert!(args.contains(&"4.0".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"60".to_string()));
        assert!(args.contains(&"30".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_noisy_stderr_does_not_stall_encode() {
        let temp_dir = tempdir().unwrap();
        let output = temp_dir.path().join("out.mp4");

        let config = TranscodingConfig {
            encode_timeout: Duration::from_secs(10),
            ..TranscodingConfig::default()
        };
        let encoder = FfmpegEncoder::new(None, config);

        // Writes ~2 MB to stderr, far past the pipe buffer, before the
        // output file appears
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(format!(
            "i=0; while [ $i -lt 2000 ]; do printf '%01024d' 0 >&2; i=$((i+1)); done; \
             head -c 512 /dev/zero > '{}'",
            output.display()
        ));
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        let size = encoder.run_encode(cmd, &output, None, None).await.unwrap();
        assert_eq!(size, 512);
    }
}
