use ffmpeg_next::{Rational, format::Pixel};

use crate::sync::Timed;

/// Time base for frames that carry no timing of their own (still images).
pub const UNSET_TIME_BASE: Rational = Rational(0, 1);

/// A decoded picture plus the time base its `pts` is expressed in.
#[derive(Clone)]
pub struct RawVideoFrame {
    frame: ffmpeg_next::frame::Video,
    time_base: Rational,
}

impl RawVideoFrame {
    pub fn new(frame: ffmpeg_next::frame::Video, time_base: Rational) -> Self {
        Self { frame, time_base }
    }

    /// Builds a packed RGB24 frame from a still image at its native size.
    pub fn from_rgb(image: &image::RgbImage) -> anyhow::Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("invalid image size {}x{}", width, height);
        }
        let mut frame = ffmpeg_next::frame::Video::new(Pixel::RGB24, width, height);
        let row_size = width as usize * 3;
        let linesize = frame.stride(0);
        let src = image.as_raw();
        let dst = frame.data_mut(0);
        for y in 0..height as usize {
            let src_offset = y * row_size;
            let dst_offset = y * linesize;
            dst[dst_offset..dst_offset + row_size]
                .copy_from_slice(&src[src_offset..src_offset + row_size]);
        }
        Ok(Self::new(frame, UNSET_TIME_BASE))
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn format(&self) -> Pixel {
        self.frame.format()
    }

    pub fn get_mut(&mut self) -> &mut ffmpeg_next::frame::Video {
        &mut self.frame
    }

    pub fn as_video(&self) -> &ffmpeg_next::frame::Video {
        &self.frame
    }

    pub fn into_video(self) -> ffmpeg_next::frame::Video {
        self.frame
    }
}

impl Timed for RawVideoFrame {
    /// Falls back to the best-effort timestamp when the decoder left `pts` unset.
    fn pts(&self) -> Option<i64> {
        self.frame.pts().or_else(|| self.frame.timestamp())
    }

    fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Replaces all timing. The best-effort timestamp is cleared as well so
    /// an unset `pts` stays unset.
    fn set_timing(&mut self, pts: Option<i64>, time_base: Rational) {
        self.frame.set_pts(pts);
        unsafe {
            (*self.frame.as_mut_ptr()).best_effort_timestamp = ffmpeg_next::ffi::AV_NOPTS_VALUE;
        }
        self.time_base = time_base;
    }
}
