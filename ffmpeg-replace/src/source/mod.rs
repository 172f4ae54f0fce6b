//! Replacement frame sources.
//!
//! A source is opened once, read strictly in order and never rewound.
//! `next_frame` separates the two ways a pull can fail to produce a frame:
//! `Ok(None)` is the natural end of the sequence, `Err` is a broken frame.

mod images;
mod video;

pub use images::{ImageSequence, numeric_key, sort_numerically};
pub use video::VideoSequence;

use crate::{config::ReplacementSpec, error::ReplaceError, frame::RawVideoFrame, scaler::FrameTarget};

/// Everything a source needs to know about the output it feeds.
#[derive(Debug, Clone, Copy)]
pub struct SourceConfig {
    pub target: FrameTarget,
    /// Decoder threads for video sources, 0 = let FFmpeg decide.
    pub decode_threads: usize,
}

pub enum ReplacementSource {
    Images(ImageSequence),
    Video(VideoSequence),
}

impl ReplacementSource {
    pub fn open(spec: &ReplacementSpec, config: SourceConfig) -> Result<Self, ReplaceError> {
        match spec {
            ReplacementSpec::Images { pattern } => Ok(Self::Images(ImageSequence::open(pattern)?)),
            ReplacementSpec::Video { path } => Ok(Self::Video(VideoSequence::open(path, config)?)),
            ReplacementSpec::Pipe => Err(ReplaceError::PipeReplacement),
            ReplacementSpec::Unsupported(desc) => {
                Err(ReplaceError::UnsupportedReplacement(desc.clone()))
            }
        }
    }

    /// Number of frames the source expects to yield, when known up front.
    pub fn expected_frames(&self) -> Option<u64> {
        match self {
            Self::Images(images) => Some(images.len() as u64),
            Self::Video(video) => video.frames(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Images(_) => "image sequence",
            Self::Video(_) => "video",
        }
    }

    pub fn next_frame(&mut self) -> anyhow::Result<Option<RawVideoFrame>> {
        match self {
            Self::Images(images) => images.next_frame(),
            Self::Video(video) => video.next_frame(),
        }
    }
}

impl Iterator for ReplacementSource {
    type Item = anyhow::Result<RawVideoFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
