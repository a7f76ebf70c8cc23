//! [`VideoSource`] backed by the `ffprobe` and `ffmpeg` binaries.
//!
//! Metadata comes from one `ffprobe` call at open time. Each seek decodes
//! exactly one frame at the requested position to raw `rgb24`, which the
//! following [`VideoSource::capture`] hands out.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;

use crate::video::{Raster, VideoError, VideoSource};

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

impl FfprobeOutput {
    fn video_stream(&self) -> Option<&FfprobeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    }

    /// Video stream duration, falling back to the container's.
    ///
    /// The container may be longer than the picture when an audio track
    /// outlasts it.
    pub fn duration_secs(&self) -> Option<f64> {
        let parse = |d: &Option<String>| d.as_deref().and_then(|s| s.parse::<f64>().ok());
        self.video_stream()
            .and_then(|s| parse(&s.duration))
            .or_else(|| parse(&self.format.duration))
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let stream = self.video_stream()?;
        Some((stream.width?, stream.height?))
    }
}

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, VideoError> {
    if !path.exists() {
        return Err(VideoError::NotFound(path.to_string_lossy().to_string()));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(VideoError::Decode(format!(
            "ffprobe exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    serde_json::from_slice::<FfprobeOutput>(&output.stdout)
        .map_err(|e| VideoError::Decode(format!("unparseable ffprobe output: {e}")))
}

// ---------------------------------------------------------------------------
// FfmpegVideoSource
// ---------------------------------------------------------------------------

/// A local video file decoded on demand by `ffmpeg`.
#[derive(Debug)]
pub struct FfmpegVideoSource {
    path: PathBuf,
    duration: Option<f64>,
    width: u32,
    height: u32,
    current: Option<Raster>,
}

impl FfmpegVideoSource {
    /// Probe `path` and prepare it for seeking.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, VideoError> {
        let path = path.into();
        let probe = probe_video(&path).await?;
        let (width, height) = probe
            .dimensions()
            .ok_or_else(|| VideoError::Decode(format!("no video stream in {}", path.display())))?;

        tracing::debug!(
            path = %path.display(),
            duration = ?probe.duration_secs(),
            width,
            height,
            "Opened video",
        );

        Ok(Self {
            duration: probe.duration_secs(),
            path,
            width,
            height,
            current: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the single frame at `timestamp_secs` as packed RGB bytes.
    async fn decode_frame(&self, timestamp_secs: f64) -> Result<Vec<u8>, VideoError> {
        let output = tokio::process::Command::new("ffmpeg")
            .args(["-v", "error", "-noautorotate", "-ss"])
            .arg(format!("{timestamp_secs:.3}"))
            .arg("-i")
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(VideoError::Decode(format!(
                "ffmpeg exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl VideoSource for FfmpegVideoSource {
    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn seek(&mut self, timestamp_secs: f64) -> Result<(), VideoError> {
        let bytes = self.decode_frame(timestamp_secs).await?;
        if bytes.is_empty() {
            self.current = None;
            return Err(VideoError::EmptyFrame { timestamp_secs });
        }
        let received = bytes.len();
        let raster = Raster::from_raw(self.width, self.height, bytes).ok_or_else(|| {
            VideoError::Decode(format!(
                "expected a {}x{} rgb24 frame at {timestamp_secs:.3}s, got {received} bytes",
                self.width, self.height
            ))
        })?;
        self.current = Some(raster);
        Ok(())
    }

    async fn capture(&mut self) -> Result<Raster, VideoError> {
        self.current.clone().ok_or(VideoError::NoFrame)
    }
}
