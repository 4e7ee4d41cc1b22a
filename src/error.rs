//! Error types for the captioning pipeline.

use std::path::PathBuf;
use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, CaptionError>;

#[derive(Debug, Error)]
pub(crate) enum CaptionError {
    /// The video cannot be opened or decoded at all. Fatal to the run.
    #[error("cannot open video source: {0}")]
    UnopenableSource(String),

    /// Every sampled index failed to decode, so there is no reference
    /// frame to size the grid from.
    #[error("no frames could be extracted from the video")]
    EmptySampleSet,

    /// A sample's dimensions differ from the first sample's. The grid
    /// never resizes, so mixed-resolution sources are rejected outright.
    #[error("frame {index} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    MismatchedFrameSize {
        index: usize,
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },

    /// The model's reply did not parse as the expected caption/keywords
    /// structure. Surfaced as-is, no repair or retry.
    #[error("model response is not valid caption/keyword data: {text}")]
    MalformedModelResponse { text: String },

    /// A user-supplied URL failed the format, playlist, or duration
    /// checks. Caught before the core pipeline runs.
    #[error("invalid video link: {reason}")]
    InvalidSourceLink { reason: String },

    /// The source is longer than the configured cap. Applies to both
    /// downloads and local files.
    #[error("video exceeds the {limit_secs}-second length limit")]
    DurationExceeded { limit_secs: u64 },

    #[error("download failed: {message}")]
    DownloadFailed { message: String },

    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("grid layout {rows}x{cols} does not hold {frames} frames")]
    LayoutMismatch { rows: u32, cols: u32, frames: u32 },

    #[error("model request timed out")]
    ModelTimeout,

    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CaptionError {
    pub(crate) fn invalid_link(reason: impl Into<String>) -> Self {
        Self::InvalidSourceLink {
            reason: reason.into(),
        }
    }

    pub(crate) fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }
}
