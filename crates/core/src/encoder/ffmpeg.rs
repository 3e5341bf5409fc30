//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use super::config::EncoderConfig;
use super::error::EncoderError;
use super::traits::Encoder;
use super::types::{
    EncodeJob, EncodeProgress, EncodeResult, MediaInfo, StreamInfo, ENCODING_POLICY,
};
use crate::ladder::RenditionSpec;

/// Minimum interval between two progress events of one job.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// FFmpeg-based encoder implementation.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Builds ffmpeg arguments for one rendition.
    fn build_args(&self, input_path: &Path, output_path: &Path, rendition: &RenditionSpec) -> Vec<String> {
        let size = rendition.frame_size;
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", size.width, size.height),
            "-c:v".to_string(),
            ENCODING_POLICY.video_codec.to_string(),
            "-preset".to_string(),
            ENCODING_POLICY.preset.to_string(),
            "-b:v".to_string(),
            rendition.video_bitrate.clone(),
            "-c:a".to_string(),
            ENCODING_POLICY.audio_codec.to_string(),
            "-b:a".to_string(),
            ENCODING_POLICY.audio_bitrate.to_string(),
        ];

        // Log level and progress
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(output_path.to_string_lossy().to_string());

        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, EncoderError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| EncoderError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            streams: probe
                .streams
                .into_iter()
                .map(|s| StreamInfo {
                    codec_type: s.codec_type,
                    codec_name: s.codec_name,
                    width: s.width,
                    height: s.height,
                })
                .collect(),
        })
    }

    /// Runs the encode with optional progress reporting.
    async fn run_encode(
        &self,
        job: &EncodeJob,
        progress_tx: Option<mpsc::Sender<EncodeProgress>>,
    ) -> Result<EncodeResult, EncoderError> {
        let start = Instant::now();

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                EncoderError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let duration_secs = job.source_duration_secs;
        let args = self.build_args(&job.input_path, &job.output_path, &job.rendition);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EncoderError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EncoderError::encode_failed("FFmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let mut current_time = 0.0;
        let mut current_speed = None;
        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let speed_regex = Regex::new(r"speed=\s*(\d+\.?\d*)x").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            // The first reported position is always sent.
            let mut last_progress_send: Option<Instant> = None;
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                let mut position_updated = false;
                if let Some(ms) = time_regex
                    .as_ref()
                    .and_then(|re| re.captures(&line))
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                {
                    // out_time_ms is in microseconds despite the name
                    current_time = ms / 1_000_000.0;
                    position_updated = true;
                }

                if let Some(speed) = speed_regex
                    .as_ref()
                    .and_then(|re| re.captures(&line))
                    .and_then(|caps| caps.get(1))
                {
                    current_speed = Some(format!("{}x", speed.as_str()));
                }

                if let Some(ref tx) = progress_tx {
                    let due = last_progress_send
                        .map_or(true, |sent| sent.elapsed() >= PROGRESS_INTERVAL);
                    if position_updated && due {
                        // Non-blocking send
                        let _ = tx.try_send(EncodeProgress {
                            job_id: job.job_id.clone(),
                            rendition: job.rendition.name.clone(),
                            percent: progress_percent(current_time, duration_secs),
                            time_secs: current_time,
                            duration_secs,
                            speed: current_speed.clone(),
                        });
                        last_progress_send = Some(Instant::now());
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(EncoderError::encode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(EncoderError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(EncoderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| EncoderError::encode_failed("Output file not created", None))?;

        if let Some(tx) = progress_tx {
            let _ = tx.try_send(EncodeProgress {
                job_id: job.job_id.clone(),
                rendition: job.rendition.name.clone(),
                percent: 100.0,
                time_secs: duration_secs.unwrap_or(current_time),
                duration_secs,
                speed: current_speed,
            });
        }

        Ok(EncodeResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn progress_percent(current_secs: f64, duration_secs: Option<f64>) -> f32 {
    match duration_secs {
        Some(dur) if dur > 0.0 => (current_secs / dur * 100.0).clamp(0.0, 100.0) as f32,
        _ => 0.0,
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, EncoderError> {
        if !path.exists() {
            return Err(EncoderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    EncoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EncoderError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn encode(&self, job: EncodeJob) -> Result<EncodeResult, EncoderError> {
        self.run_encode(&job, None).await
    }

    async fn encode_with_progress(
        &self,
        job: EncodeJob,
        progress_tx: mpsc::Sender<EncodeProgress>,
    ) -> Result<EncodeResult, EncoderError> {
        self.run_encode(&job, Some(progress_tx)).await
    }

    async fn validate(&self) -> Result<(), EncoderError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EncoderError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(EncoderError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(EncoderError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(EncoderError::Io(e));
        }

        Ok(())
    }
}
