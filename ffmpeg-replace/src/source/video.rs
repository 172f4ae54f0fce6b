use std::path::Path;

use anyhow::Context;

use crate::{
    classify::{StreamLayout, find_video_stream},
    decoder::VideoDecoder,
    error::ReplaceError,
    frame::RawVideoFrame,
    input::AvInput,
    scaler::{Scaler, conform},
    sync::Timed,
};

use super::SourceConfig;

/// Frames decoded from a secondary container and converted to the output
/// geometry one at a time.
pub struct VideoSequence {
    input: AvInput,
    decoder: VideoDecoder,
    video_index: usize,
    config: SourceConfig,
    scaler: Option<Scaler>,
    frames: Option<u64>,
    input_done: bool,
}

impl VideoSequence {
    pub fn open(path: &Path, config: SourceConfig) -> Result<Self, ReplaceError> {
        let input = AvInput::open(path)?;
        let layouts: Vec<StreamLayout> = input.streams().iter().map(StreamLayout::from).collect();
        let video_index = find_video_stream(&layouts)?;
        let stream = input
            .stream(video_index)
            .ok_or_else(|| anyhow::anyhow!("video stream {} missing", video_index))?;
        let frames = stream.frames();
        let decoder = VideoDecoder::new(stream, config.decode_threads)
            .with_context(|| format!("failed to open decoder for {}", path.display()))?;

        log::info!(
            "replacement video {} ({}): stream {}, {}x{}, {} frames, converting to {}x{} {:?}",
            path.display(),
            input.format_name(),
            video_index,
            stream.width(),
            stream.height(),
            frames.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            config.target.width,
            config.target.height,
            config.target.pixel_format,
        );

        Ok(Self {
            input,
            decoder,
            video_index,
            config,
            scaler: None,
            frames,
            input_done: false,
        })
    }

    /// Frame count declared by the container, if any.
    pub fn frames(&self) -> Option<u64> {
        self.frames
    }

    pub fn next_frame(&mut self) -> anyhow::Result<Option<RawVideoFrame>> {
        loop {
            if let Some(frame) = self.decoder.receive_frame()? {
                return self.convert(frame).map(Some);
            }
            if self.input_done {
                return Ok(None);
            }
            match self.input.read_packet()? {
                Some(packet) if packet.index() == self.video_index => {
                    self.decoder.send_packet(&packet)?;
                }
                Some(_) => {}
                None => {
                    self.decoder.send_eof()?;
                    self.input_done = true;
                }
            }
        }
    }

    fn convert(&mut self, frame: RawVideoFrame) -> anyhow::Result<RawVideoFrame> {
        let time_base = frame.time_base();
        let converted = conform(&mut self.scaler, frame.into_video(), self.config.target)?;
        Ok(RawVideoFrame::new(converted, time_base))
    }
}
