use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::DecoderConfig;
use crate::error::BootTimeError;
use crate::frames::FrameSequence;

/// Sampling window and output geometry for turning a recording into frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    pub fps: u32,
    pub start_offset_secs: u32,
    pub duration_secs: u32,
    pub width: u32,
    pub height: u32,
    pub frame_extension: String,
}

impl From<&DecoderConfig> for DecodeRequest {
    fn from(config: &DecoderConfig) -> Self {
        Self {
            fps: config.fps,
            start_offset_secs: config.start_offset_secs,
            duration_secs: config.duration_secs,
            width: config.width,
            height: config.height,
            frame_extension: config.frame_extension.clone(),
        }
    }
}

/// Turns an encoded recording into numbered still frames.
#[async_trait]
pub trait VideoDecoder: Send + Sync {
    async fn decode(
        &self,
        video: &Path,
        request: &DecodeRequest,
        frames_dir: &Path,
    ) -> Result<FrameSequence<PathBuf>, BootTimeError>;
}

/// Decodes through an external `ffmpeg` binary into `%04d.<ext>` files numbered from 1.
pub struct FfmpegDecoder {
    ffmpeg_path: PathBuf,
}

impl FfmpegDecoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    fn command_args(video: &Path, request: &DecodeRequest, frames_dir: &Path) -> Vec<OsString> {
        let pattern = frames_dir.join(format!("%04d.{}", request.frame_extension));
        vec![
            "-y".into(),
            "-i".into(),
            video.as_os_str().to_owned(),
            "-r".into(),
            request.fps.to_string().into(),
            "-ss".into(),
            clock(request.start_offset_secs).into(),
            "-t".into(),
            clock(request.duration_secs).into(),
            "-s".into(),
            format!("{}x{}", request.width, request.height).into(),
            pattern.into_os_string(),
        ]
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl VideoDecoder for FfmpegDecoder {
    async fn decode(
        &self,
        video: &Path,
        request: &DecodeRequest,
        frames_dir: &Path,
    ) -> Result<FrameSequence<PathBuf>, BootTimeError> {
        let args = Self::command_args(video, request, frames_dir);
        debug!("Running {} {:?}", self.ffmpeg_path.display(), args);

        let output = Command::new(&self.ffmpeg_path).args(&args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BootTimeError::Decode(format!(
                "{} exited with {}: {}",
                self.ffmpeg_path.display(),
                output.status,
                tail(&stderr, 10)
            )));
        }

        let frames = FrameSequence::from_dir(frames_dir, &request.frame_extension)?;
        info!(
            frames = frames.len(),
            dir = %frames_dir.display(),
            "Decoded recording into frames"
        );
        Ok(frames)
    }
}

/// `HH:MM:SS` as ffmpeg expects for `-ss` / `-t`.
fn clock(total_secs: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60
    )
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DecodeRequest {
        DecodeRequest::from(&DecoderConfig::default())
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(clock(1), "00:00:01");
        assert_eq!(clock(10), "00:00:10");
        assert_eq!(clock(3725), "01:02:05");
    }

    #[test]
    fn test_command_args() {
        let args = FfmpegDecoder::command_args(Path::new("rec.mp4"), &request(), Path::new("pngs"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let pattern = Path::new("pngs").join("%04d.png");
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "rec.mp4",
                "-r",
                "50",
                "-ss",
                "00:00:01",
                "-t",
                "00:00:10",
                "-s",
                "1080x1920",
                pattern.to_str().unwrap(),
            ]
        );
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail("only", 5), "only");
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = FfmpegDecoder::new("/no/such/ffmpeg-binary");
        let result = decoder
            .decode(Path::new("rec.mp4"), &request(), dir.path())
            .await;
        assert!(matches!(result, Err(BootTimeError::Io(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_binary_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = FfmpegDecoder::new("false");
        let result = decoder
            .decode(Path::new("rec.mp4"), &request(), dir.path())
            .await;
        assert!(matches!(result, Err(BootTimeError::Decode(_))));
    }
}
