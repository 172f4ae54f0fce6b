//! Small test videos written with the crate's own encoder and muxer.
//!
//! Frame `i` is a flat gray picture with luma [`shade`]`(i)`, so decoded
//! order can be checked by sampling a single pixel.

use std::path::Path;

use ffmpeg_next::{Rational, format::Pixel};

use crate::{
    codec::CodecChoice,
    encoder::{Settings, VideoEncoder},
    frame::RawVideoFrame,
    output::AvOutput,
    scaler::FrameTarget,
    sync::StreamPacket,
};

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 48;
pub const TIME_BASE: Rational = Rational(1, 10);

/// Lossless, and built into every FFmpeg.
const CODEC: CodecChoice = CodecChoice {
    name: "ffv1",
    options: &[],
};

pub fn shade(i: u32) -> u8 {
    (16 + i * 20).min(235) as u8
}

pub fn gray_frame(width: u32, height: u32, luma: u8, pts: i64) -> RawVideoFrame {
    let mut frame = ffmpeg_next::frame::Video::new(Pixel::YUV420P, width, height);
    frame.data_mut(0).fill(luma);
    frame.data_mut(1).fill(128);
    frame.data_mut(2).fill(128);
    frame.set_pts(Some(pts));
    RawVideoFrame::new(frame, TIME_BASE)
}

/// Luma of the center pixel.
pub fn center_luma(frame: &RawVideoFrame) -> u8 {
    let video = frame.as_video();
    let (x, y) = (video.width() as usize / 2, video.height() as usize / 2);
    video.data(0)[y * video.stride(0) + x]
}

/// Writes `frames` gray frames at 10 fps into a single-stream container.
/// Returns `Ok(false)` when the linked FFmpeg lacks the fixture encoder.
pub fn write_video(path: &Path, frames: u32) -> anyhow::Result<bool> {
    crate::init()?;
    if ffmpeg_next::encoder::find_by_name(CODEC.name).is_none() {
        eprintln!("skip: {} encoder not available", CODEC.name);
        return Ok(false);
    }

    let mut output = AvOutput::create(path)?;
    let mut encoder = VideoEncoder::open(
        &CODEC,
        Settings {
            target: FrameTarget {
                width: WIDTH,
                height: HEIGHT,
                pixel_format: Pixel::YUV420P,
            },
            time_base: TIME_BASE,
            frame_rate: Some(Rational(10, 1)),
            global_header: output.needs_global_header(),
        },
    )?;
    let index = output.add_video_stream(&encoder, TIME_BASE)?;

    for i in 0..frames {
        encoder.send_frame(gray_frame(WIDTH, HEIGHT, shade(i), i as i64))?;
        while let Some(mut packet) = encoder.receive_packet()? {
            packet.set_stream_index(index);
            output.write_packet(packet)?;
        }
    }
    encoder.send_eof()?;
    while let Some(mut packet) = encoder.receive_packet()? {
        packet.set_stream_index(index);
        output.write_packet(packet)?;
    }
    output.finish()?;
    Ok(true)
}
