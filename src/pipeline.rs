//! End-to-end run: acquire video, sample, compose, request caption.

use std::fs;
use std::path::{Path, PathBuf};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use image::codecs::jpeg;
use tracing::{debug, info};

use crate::ai::{self, CaptionResult};
use crate::download;
use crate::error::{CaptionError, Result};
use crate::grid::{self, GridLayout};
use crate::link;
use crate::sampler;
use crate::video::FfmpegSource;

/// Where the video comes from.
#[derive(Debug, Clone)]
pub(crate) enum VideoInput {
    Upload(PathBuf),
    Youtube(String),
}

/// Everything one run needs, passed by value through the stages.
#[derive(Debug, Clone)]
pub(crate) struct CaptionRequest {
    pub input: VideoInput,
    pub layout: GridLayout,
    pub frame_count: u32,
    pub max_duration_secs: u64,
    pub video_path: PathBuf,
    pub grid_path: PathBuf,
    pub api_key: Option<String>,
    pub keep_artifacts: bool,
}

impl CaptionRequest {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.frame_count == 0 || self.layout.rows == 0 || self.layout.cols == 0 {
            return Err(CaptionError::LayoutMismatch {
                rows: self.layout.rows,
                cols: self.layout.cols,
                frames: self.frame_count,
            });
        }
        if self.layout.cell_count() != self.frame_count {
            return Err(CaptionError::LayoutMismatch {
                rows: self.layout.rows,
                cols: self.layout.cols,
                frames: self.frame_count,
            });
        }
        if let VideoInput::Youtube(url) = &self.input {
            link::validate_youtube_link(url)?;
        }
        Ok(())
    }
}

pub(crate) async fn run(request: CaptionRequest) -> Result<CaptionResult> {
    request.validate()?;

    let result = execute(&request).await;
    if !request.keep_artifacts {
        cleanup(&request);
    }
    result
}

async fn execute(request: &CaptionRequest) -> Result<CaptionResult> {
    let video_path = match &request.input {
        VideoInput::Upload(path) => {
            if !path.exists() {
                return Err(CaptionError::FileNotFound(path.clone()));
            }
            path.clone()
        }
        VideoInput::Youtube(url) => {
            download::download_video(url, &request.video_path).await?;
            request.video_path.clone()
        }
    };

    let frames = {
        let mut source = FfmpegSource::open(&video_path)?;
        link::check_duration(source.duration_secs(), request.max_duration_secs)?;
        sampler::sample_frames(&mut source, request.frame_count)?
    };
    info!(sampled = frames.len(), requested = request.frame_count, "sampling done");

    let composite = grid::compose_grid(&frames, &request.layout)?;
    debug!(
        width = composite.width(),
        height = composite.height(),
        "composed grid"
    );

    let jpeg_data = encode_jpeg(&composite)?;
    fs::write(&request.grid_path, &jpeg_data)?;

    ai::caption_grid(&BASE64_STANDARD.encode(&jpeg_data), request.api_key.as_deref()).await
}

fn encode_jpeg(image: &image::RgbImage) -> Result<Vec<u8>> {
    let mut jpeg_data = Vec::new();
    let mut encoder = jpeg::JpegEncoder::new_with_quality(&mut jpeg_data, 100);
    encoder.encode(
        image,
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(jpeg_data)
}

/// Remove the fixed-name artifacts of a run. Uploaded source files are the
/// user's and are left alone; only downloads and the grid are removed.
fn cleanup(request: &CaptionRequest) {
    let mut paths: Vec<&Path> = vec![&request.grid_path];
    if matches!(request.input, VideoInput::Youtube(_)) {
        paths.push(&request.video_path);
    }
    for path in paths {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                debug!(path = %path.display(), error = %e, "could not remove artifact");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(input: VideoInput, layout: GridLayout, frame_count: u32) -> CaptionRequest {
        CaptionRequest {
            input,
            layout,
            frame_count,
            max_duration_secs: 300,
            video_path: PathBuf::from("input_vid.mp4"),
            grid_path: PathBuf::from("input_grid.jpg"),
            api_key: None,
            keep_artifacts: false,
        }
    }

    #[test]
    fn layout_must_match_frame_count() {
        let req = request(
            VideoInput::Upload(PathBuf::from("in.mp4")),
            GridLayout::new(3, 3, 10),
            8,
        );
        let err = req.validate().unwrap_err();
        assert!(matches!(err, CaptionError::LayoutMismatch { .. }));
    }

    #[test]
    fn zero_cell_layout_is_rejected() {
        // 0 rows x 3 cols holds 0 cells, which would otherwise satisfy a
        // frame count of 0 and hand the sampler a zero divisor.
        let req = request(
            VideoInput::Upload(PathBuf::from("in.mp4")),
            GridLayout::new(0, 3, 10),
            0,
        );
        let err = req.validate().unwrap_err();
        assert!(matches!(err, CaptionError::LayoutMismatch { .. }));

        let req = request(
            VideoInput::Upload(PathBuf::from("in.mp4")),
            GridLayout::new(3, 0, 10),
            9,
        );
        req.validate().unwrap_err();
    }

    #[test]
    fn matching_layout_passes() {
        let req = request(
            VideoInput::Upload(PathBuf::from("in.mp4")),
            GridLayout::new(2, 4, 10),
            8,
        );
        req.validate().unwrap();
    }

    #[test]
    fn invalid_link_is_caught_before_the_pipeline() {
        let req = request(
            VideoInput::Youtube("https://vimeo.com/1".into()),
            GridLayout::default(),
            9,
        );
        let err = req.validate().unwrap_err();
        assert!(matches!(err, CaptionError::InvalidSourceLink { .. }));
    }

    #[tokio::test]
    async fn missing_upload_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let req = CaptionRequest {
            input: VideoInput::Upload(dir.path().join("absent.mp4")),
            layout: GridLayout::default(),
            frame_count: 9,
            max_duration_secs: 300,
            video_path: dir.path().join("input_vid.mp4"),
            grid_path: dir.path().join("input_grid.jpg"),
            api_key: None,
            keep_artifacts: false,
        };
        let err = run(req).await.unwrap_err();
        assert!(matches!(err, CaptionError::FileNotFound(_)));
    }

    #[test]
    fn cleanup_removes_grid_and_downloaded_video() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input_vid.mp4");
        let grid = dir.path().join("input_grid.jpg");
        fs::write(&video, b"video").unwrap();
        fs::write(&grid, b"grid").unwrap();

        let mut req = request(
            VideoInput::Youtube("https://youtu.be/dQw4w9WgXcQ".into()),
            GridLayout::default(),
            9,
        );
        req.video_path = video.clone();
        req.grid_path = grid.clone();
        cleanup(&req);
        assert!(!video.exists());
        assert!(!grid.exists());
    }

    #[test]
    fn cleanup_leaves_uploaded_video_alone() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("input_vid.mp4");
        let grid = dir.path().join("input_grid.jpg");
        fs::write(&video, b"video").unwrap();
        fs::write(&grid, b"grid").unwrap();

        let mut req = request(VideoInput::Upload(video.clone()), GridLayout::default(), 9);
        req.video_path = video.clone();
        req.grid_path = grid.clone();
        cleanup(&req);
        assert!(video.exists());
        assert!(!grid.exists());
    }

    #[tokio::test]
    async fn keep_artifacts_skips_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let grid = dir.path().join("input_grid.jpg");
        fs::write(&grid, b"grid").unwrap();

        let mut req = request(
            VideoInput::Upload(dir.path().join("absent.mp4")),
            GridLayout::default(),
            9,
        );
        req.grid_path = grid.clone();
        req.keep_artifacts = true;

        // The run fails on the missing upload either way; only the
        // keep flag decides whether the grid artifact survives.
        run(req.clone()).await.unwrap_err();
        assert!(grid.exists());

        req.keep_artifacts = false;
        run(req).await.unwrap_err();
        assert!(!grid.exists());
    }

    #[test]
    fn jpeg_encoding_produces_a_jpeg() {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 10, 200]));
        let data = encode_jpeg(&img).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }
}
