//! Input video description logged before a run (similar to ffprobe).

use std::fmt;

use ffmpeg_next::Rational;

use crate::stream::AvStream;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    pub index: usize,
    /// Start time in `time_base` units; None if unknown.
    pub start_time: Option<i64>,
    pub time_base: Rational,
    /// Average frame rate, e.g. 30000/1001.
    pub frame_rate: Rational,
    /// Nominal frame count; None if the container does not declare it.
    pub frames: Option<u64>,
    pub width: u32,
    pub height: u32,
}

impl From<&AvStream> for VideoProbe {
    fn from(stream: &AvStream) -> Self {
        Self {
            index: stream.index(),
            start_time: stream.start_time(),
            time_base: stream.time_base(),
            frame_rate: stream.rate(),
            frames: stream.frames(),
            width: stream.width(),
            height: stream.height(),
        }
    }
}

impl fmt::Display for VideoProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input video (stream {}):", self.index)?;
        match self.start_time {
            Some(t) => writeln!(f, "  start_time: {}", t)?,
            None => writeln!(f, "  start_time: N/A")?,
        }
        writeln!(f, "  time_base: {}", self.time_base)?;
        writeln!(f, "  frame_rate: {}", self.frame_rate)?;
        match self.frames {
            Some(n) => writeln!(f, "  frames: {}", n)?,
            None => writeln!(f, "  frames: unknown")?,
        }
        writeln!(f, "  width: {}", self.width)?;
        write!(f, "  height: {}", self.height)
    }
}
