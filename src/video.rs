//! Video opening and frame decoding on top of ffmpeg.
//!
//! The sampler talks to the [`FrameDecoder`] trait rather than to ffmpeg
//! directly, so it can be exercised against an in-memory stub in tests.

use std::path::Path;
use std::sync::Once;

use ffmpeg::util::frame::video::Video;
use ffmpeg_next::{self as ffmpeg, codec, decoder, format, media, software, Packet, Rational};
use image::RgbImage;
use tracing::debug;

use crate::error::{CaptionError, Result};

static INIT: Once = Once::new();

pub(crate) fn init() {
    INIT.call_once(|| {
        ffmpeg::init().unwrap();
    });
}

/// A seekable sequence of frames with a known total count.
pub(crate) trait FrameDecoder {
    fn total_frames(&self) -> u64;

    /// Position the source so the next read returns the frame at `index`.
    fn seek(&mut self, index: u64) -> Result<()>;

    /// Decode the frame at the current position as RGB.
    fn read_frame(&mut self) -> Result<RgbImage>;
}

/// Frame decoder backed by an ffmpeg demuxer + video decoder.
///
/// Seeking lands on the nearest preceding keyframe; `read_frame` then
/// decodes forward until it reaches the requested timestamp.
pub(crate) struct FfmpegSource {
    input: format::context::Input,
    decoder: decoder::Video,
    scaler: software::scaling::context::Context,
    stream_index: usize,
    time_base: Rational,
    frame_rate: f64,
    total_frames: u64,
    duration_secs: Option<f64>,
    target_pts: i64,
    eof_sent: bool,
}

impl FfmpegSource {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        init();

        let input = format::input(&path)
            .map_err(|e| CaptionError::UnopenableSource(format!("{}: {e}", path.display())))?;

        let stream = input
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| CaptionError::UnopenableSource("no video stream found".into()))?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let frame_rate: f64 = stream.avg_frame_rate().into();
        if frame_rate <= 0.0 {
            return Err(CaptionError::UnopenableSource(
                "video stream has no frame rate".into(),
            ));
        }

        // Containers without an exact frame count get an estimate from
        // duration and frame rate instead.
        let duration_secs = (input.duration() > 0)
            .then(|| input.duration() as f64 * f64::from(ffmpeg::rescale::TIME_BASE));
        let total_frames = match stream.frames() {
            n if n > 0 => n as u64,
            _ => duration_secs.map_or(0, |secs| (secs * frame_rate) as u64),
        };

        let decoder = codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| CaptionError::UnopenableSource(e.to_string()))?
            .decoder()
            .video()
            .map_err(|e| CaptionError::UnopenableSource(e.to_string()))?;

        let scaler = software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| CaptionError::UnopenableSource(e.to_string()))?;

        debug!(
            path = %path.display(),
            total_frames,
            frame_rate,
            "opened video source"
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            frame_rate,
            total_frames,
            duration_secs,
            target_pts: 0,
            eof_sent: false,
        })
    }

    pub(crate) fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    fn frame_to_rgb(&mut self, decoded: &Video) -> Result<RgbImage> {
        let mut rgb = Video::empty();
        self.scaler.run(decoded, &mut rgb)?;

        let width = rgb.width();
        let height = rgb.height();
        let row_len = width as usize * 3;
        let stride = rgb.stride(0);

        // The scaler may pad each row out to an aligned stride.
        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in rgb.data(0).chunks(stride).take(height as usize) {
            data.extend_from_slice(&row[..row_len]);
        }

        RgbImage::from_raw(width, height, data).ok_or_else(|| {
            CaptionError::UnopenableSource("decoded frame has unexpected size".into())
        })
    }
}

impl FrameDecoder for FfmpegSource {
    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn seek(&mut self, index: u64) -> Result<()> {
        let seconds = index as f64 / self.frame_rate;
        let pos = (seconds / f64::from(ffmpeg::rescale::TIME_BASE)) as i64;
        self.input.seek(pos, ..pos)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.target_pts = (seconds / f64::from(self.time_base)) as i64;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<RgbImage> {
        let mut decoded = Video::empty();
        loop {
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.timestamp().unwrap_or(0);
                if pts < self.target_pts {
                    continue;
                }
                return self.frame_to_rgb(&decoded);
            }
            if self.eof_sent {
                return Err(ffmpeg::Error::Eof.into());
            }
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
