use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::TempPath;
use tokio::process::Command;

use crate::{api::error, modules::media::aspect_ratio::AspectRatio};

#[async_trait::async_trait]
pub trait MediaProcessor {
    /// Probes the first video stream of `input` and buckets its shape.
    async fn aspect_ratio(&self, input: &Path) -> Result<AspectRatio, error::SystemError>;

    /// Rewrites `input` with its metadata atom first. The returned path is
    /// removed when dropped.
    async fn fast_start(&self, input: &Path) -> Result<TempPath, error::SystemError>;
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

/// Width and height of the first stream that reports both.
pub fn parse_ffprobe_dimensions(json: &[u8]) -> Result<(u32, u32), error::SystemError> {
    let output: FfprobeOutput = serde_json::from_slice(json)?;

    output
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        })
        .ok_or_else(|| error::SystemError::process("ffprobe reported no video stream"))
}

/// Runs `ffprobe` / `ffmpeg` as child processes.
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegProcessor {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self { ffmpeg: ffmpeg.into(), ffprobe: ffprobe.into() }
    }
}

fn failure(tool: &str, output: &std::process::Output) -> error::SystemError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    error::SystemError::process(format!("{tool} exited with {}: {}", output.status, stderr.trim()))
}

#[async_trait::async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn aspect_ratio(&self, input: &Path) -> Result<AspectRatio, error::SystemError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(input)
            .output()
            .await
            .map_err(|e| error::SystemError::process(format!("failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(failure("ffprobe", &output));
        }

        let (width, height) = parse_ffprobe_dimensions(&output.stdout)?;
        let aspect = AspectRatio::from_dimensions(width, height);
        log::debug!("{} is {width}x{height} ({aspect})", input.display());
        Ok(aspect)
    }

    async fn fast_start(&self, input: &Path) -> Result<TempPath, error::SystemError> {
        let mut out = PathBuf::from(input);
        out.as_mut_os_string().push(".processing");
        let out = TempPath::try_from_path(out)?;

        let output = Command::new(&self.ffmpeg)
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4", "-y"])
            .arg(&*out)
            .output()
            .await
            .map_err(|e| error::SystemError::process(format!("failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(failure("ffmpeg", &output));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_video_stream() {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":1920,"height":1080}]}"#;
        assert_eq!(parse_ffprobe_dimensions(json).unwrap(), (1920, 1080));
    }

    #[test]
    fn test_parse_skips_audio_stream() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "sample_rate": "48000"},
                {"index": 1, "codec_type": "video", "width": 608, "height": 1080}
            ]
        }"#;
        assert_eq!(parse_ffprobe_dimensions(json).unwrap(), (608, 1080));
    }

    #[test]
    fn test_parse_without_streams_fails() {
        assert!(matches!(
            parse_ffprobe_dimensions(br#"{"streams":[]}"#),
            Err(error::SystemError::ProcessError(_))
        ));
        assert!(parse_ffprobe_dimensions(br#"{}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_ffprobe_dimensions(b"not json"),
            Err(error::SystemError::JsonError(_))
        ));
    }

    #[actix_web::test]
    async fn test_missing_binary_is_process_error() {
        let processor = FfmpegProcessor::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        let result = processor.aspect_ratio(Path::new("video.mp4")).await;
        assert!(matches!(result, Err(error::SystemError::ProcessError(_))));
    }
}
