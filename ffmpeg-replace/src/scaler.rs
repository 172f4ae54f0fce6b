use ffmpeg_next::{format::Pixel, software::scaling};

/// Geometry and pixel format a frame is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTarget {
    pub width: u32,
    pub height: u32,
    pub pixel_format: Pixel,
}

/// One-in-one-out scale + pixel format conversion with Lanczos resampling.
pub struct Scaler {
    context: scaling::Context,
    source: (Pixel, u32, u32),
    target: FrameTarget,
}

impl Scaler {
    pub fn new(format: Pixel, width: u32, height: u32, target: FrameTarget) -> anyhow::Result<Self> {
        let context = scaling::Context::get(
            format,
            width,
            height,
            target.pixel_format,
            target.width,
            target.height,
            scaling::Flags::LANCZOS,
        )?;
        Ok(Self {
            context,
            source: (format, width, height),
            target,
        })
    }

    /// True when frames of this shape can go through the existing context.
    pub fn accepts(&self, frame: &ffmpeg_next::frame::Video) -> bool {
        self.source == (frame.format(), frame.width(), frame.height())
    }

    pub fn target(&self) -> FrameTarget {
        self.target
    }

    /// Converts one frame, carrying its `pts` across.
    pub fn convert(
        &mut self,
        frame: &ffmpeg_next::frame::Video,
    ) -> anyhow::Result<ffmpeg_next::frame::Video> {
        let mut converted = ffmpeg_next::frame::Video::empty();
        self.context.run(frame, &mut converted)?;
        converted.set_pts(frame.pts());
        Ok(converted)
    }
}

unsafe impl Send for Scaler {}

/// Converts `frame` to `target`, rebuilding the cached scaler whenever the
/// incoming frame shape changes. Frames already in the target shape pass
/// through untouched.
pub fn conform(
    scaler: &mut Option<Scaler>,
    frame: ffmpeg_next::frame::Video,
    target: FrameTarget,
) -> anyhow::Result<ffmpeg_next::frame::Video> {
    if frame.format() == target.pixel_format
        && frame.width() == target.width
        && frame.height() == target.height
    {
        return Ok(frame);
    }
    let reusable = scaler
        .as_ref()
        .is_some_and(|s| s.accepts(&frame) && s.target() == target);
    if !reusable {
        *scaler = Some(Scaler::new(
            frame.format(),
            frame.width(),
            frame.height(),
            target,
        )?);
    }
    match scaler.as_mut() {
        Some(s) => s.convert(&frame),
        None => anyhow::bail!("scaler not initialized"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_frame(width: u32, height: u32) -> ffmpeg_next::frame::Video {
        let mut frame = ffmpeg_next::frame::Video::new(Pixel::RGB24, width, height);
        for b in frame.data_mut(0) {
            *b = 128;
        }
        frame.set_pts(Some(17));
        frame
    }

    #[test]
    fn test_conform_scales_and_converts() -> anyhow::Result<()> {
        let target = FrameTarget {
            width: 32,
            height: 18,
            pixel_format: Pixel::YUV420P,
        };
        let mut scaler = None;
        let out = conform(&mut scaler, rgb_frame(64, 36), target)?;
        assert_eq!(out.width(), 32);
        assert_eq!(out.height(), 18);
        assert_eq!(out.format(), Pixel::YUV420P);
        assert_eq!(out.pts(), Some(17));
        assert!(scaler.is_some());
        Ok(())
    }

    #[test]
    fn test_conform_passes_matching_frames_through() -> anyhow::Result<()> {
        let target = FrameTarget {
            width: 16,
            height: 16,
            pixel_format: Pixel::RGB24,
        };
        let mut scaler = None;
        let out = conform(&mut scaler, rgb_frame(16, 16), target)?;
        assert_eq!(out.format(), Pixel::RGB24);
        assert!(scaler.is_none());
        Ok(())
    }
}
