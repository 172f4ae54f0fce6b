use ffmpeg_next::{Rational, codec::Parameters, ffi, format::stream, media};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Other,
}

/// Snapshot of one demuxed stream, detached from its format context.
pub struct AvStream {
    index: usize,
    parameters: Parameters,
    kind: StreamKind,
    time_base: Rational,
    rate: Rational,
    start_time: Option<i64>,
    frames: Option<u64>,
    size: (u32, u32),
}

unsafe impl Send for AvStream {}
unsafe impl Sync for AvStream {}

impl AvStream {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn is_video(&self) -> bool {
        self.kind == StreamKind::Video
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// Average frame rate; 0/0 when the container does not know it.
    pub fn rate(&self) -> Rational {
        self.rate
    }

    /// Presentation start in `time_base` units, if the container declares one.
    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    /// Nominal frame count from the container header.
    pub fn frames(&self) -> Option<u64> {
        self.frames
    }

    /// Coded picture size, 0x0 for non-video streams.
    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }
}

fn picture_size(parameters: &Parameters) -> (u32, u32) {
    // SAFETY: `as_ptr` points at the AVCodecParameters owned by `parameters`.
    let raw = unsafe { &*parameters.as_ptr() };
    (raw.width.max(0) as u32, raw.height.max(0) as u32)
}

impl From<stream::Stream<'_>> for AvStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        // Cloned so the snapshot outlives the borrow of the demuxer.
        let parameters = stream.parameters().clone();
        let kind = if parameters.medium() == media::Type::Video {
            StreamKind::Video
        } else {
            StreamKind::Other
        };
        let size = match kind {
            StreamKind::Video => picture_size(&parameters),
            StreamKind::Other => (0, 0),
        };
        let start_time = stream.start_time();
        let frames = stream.frames();
        Self {
            index: stream.index(),
            kind,
            time_base: stream.time_base(),
            rate: stream.avg_frame_rate(),
            start_time: (start_time != ffi::AV_NOPTS_VALUE).then_some(start_time),
            frames: u64::try_from(frames).ok().filter(|n| *n > 0),
            size,
            parameters,
        }
    }
}

impl Clone for AvStream {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
            ..*self
        }
    }
}
