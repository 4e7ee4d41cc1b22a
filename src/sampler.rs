//! Evenly spaced frame sampling.

use image::RgbImage;
use tracing::warn;

use crate::error::{CaptionError, Result};
use crate::video::FrameDecoder;

/// Extract up to `count` evenly spaced frames from `source`, in index order.
///
/// The sampling interval is `max(1, total_frames / count)`, so a short video
/// simply yields fewer frames once the indices run off the end. Frames that
/// fail to decode are skipped, never replaced; an empty result is left for
/// the grid composer to reject.
pub(crate) fn sample_frames(source: &mut dyn FrameDecoder, count: u32) -> Result<Vec<RgbImage>> {
    let total = source.total_frames();
    if total == 0 {
        return Err(CaptionError::UnopenableSource(
            "video reports zero frames".into(),
        ));
    }

    let interval = (total / u64::from(count)).max(1);
    let mut frames = Vec::with_capacity(count as usize);
    for i in 0..u64::from(count) {
        let index = i * interval;
        let result = source.seek(index).and_then(|()| source.read_frame());
        match result {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                warn!(index, error = %e, "frame could not be read, skipping");
            }
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Decoder stub that serves 2x2 frames and fails on chosen indices.
    struct StubDecoder {
        total: u64,
        failing: HashSet<u64>,
        position: u64,
        reads: Vec<u64>,
    }

    impl StubDecoder {
        fn new(total: u64) -> Self {
            Self {
                total,
                failing: HashSet::new(),
                position: 0,
                reads: Vec::new(),
            }
        }

        fn failing_at(mut self, indices: &[u64]) -> Self {
            self.failing = indices.iter().copied().collect();
            self
        }
    }

    impl FrameDecoder for StubDecoder {
        fn total_frames(&self) -> u64 {
            self.total
        }

        fn seek(&mut self, index: u64) -> Result<()> {
            self.position = index;
            Ok(())
        }

        fn read_frame(&mut self) -> Result<RgbImage> {
            if self.position >= self.total || self.failing.contains(&self.position) {
                return Err(CaptionError::Ffmpeg(ffmpeg_next::Error::Eof));
            }
            self.reads.push(self.position);
            Ok(RgbImage::new(2, 2))
        }
    }

    #[test]
    fn samples_evenly_spaced_indices() {
        let mut source = StubDecoder::new(270);
        let frames = sample_frames(&mut source, 9).unwrap();
        assert_eq!(frames.len(), 9);
        assert_eq!(source.reads, vec![0, 30, 60, 90, 120, 150, 180, 210, 240]);
    }

    #[test]
    fn indices_strictly_increase() {
        let mut source = StubDecoder::new(1000);
        sample_frames(&mut source, 9).unwrap();
        assert!(source.reads.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unreadable_index_is_skipped() {
        let mut source = StubDecoder::new(270).failing_at(&[240]);
        let frames = sample_frames(&mut source, 9).unwrap();
        assert_eq!(frames.len(), 8);
    }

    #[test]
    fn zero_frame_video_is_unopenable() {
        let mut source = StubDecoder::new(0);
        let err = sample_frames(&mut source, 9).unwrap_err();
        assert!(matches!(err, CaptionError::UnopenableSource(_)));
    }

    #[test]
    fn short_video_yields_fewer_frames() {
        // 5 frames at n=9 gives interval 1; indices 5..8 run off the end.
        let mut source = StubDecoder::new(5);
        let frames = sample_frames(&mut source, 9).unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(source.reads, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn all_indices_unreadable_yields_empty_set() {
        let mut source = StubDecoder::new(9).failing_at(&[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let frames = sample_frames(&mut source, 9).unwrap();
        assert!(frames.is_empty());
    }
}
