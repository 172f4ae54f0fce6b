use ffmpeg_next::{Rational, codec::threading};

use crate::{frame::RawVideoFrame, packet::RawPacket, stream::AvStream, sync::Decode};

/// Video decoder bound to one input stream. Frames come out in the stream's
/// time base.
pub struct VideoDecoder {
    inner: ffmpeg_next::codec::decoder::Video,
    time_base: Rational,
}

impl VideoDecoder {
    /// `threads` of 0 lets FFmpeg pick the worker count.
    pub fn new(stream: &AvStream, threads: usize) -> anyhow::Result<Self> {
        if !stream.is_video() {
            return Err(anyhow::anyhow!("stream {} is not video", stream.index()));
        }
        let mut decoder_ctx = ffmpeg_next::codec::Context::new();
        unsafe {
            (*decoder_ctx.as_mut_ptr()).time_base = stream.time_base().into();
            (*decoder_ctx.as_mut_ptr()).pkt_timebase = stream.time_base().into();
        }
        decoder_ctx.set_parameters(stream.parameters().clone())?;
        decoder_ctx.set_threading(threading::Config {
            kind: threading::Type::Frame,
            count: threads,
            ..Default::default()
        });

        let video_decoder = decoder_ctx.decoder().video()?;
        if video_decoder.format() == ffmpeg_next::format::Pixel::None
            || video_decoder.width() == 0
            || video_decoder.height() == 0
        {
            return Err(anyhow::anyhow!("missing codec parameters"));
        }
        log::debug!(
            "video decoder opened: stream {}, {}x{} {:?}, threads {}",
            stream.index(),
            video_decoder.width(),
            video_decoder.height(),
            video_decoder.format(),
            threads
        );

        Ok(Self {
            inner: video_decoder,
            time_base: stream.time_base(),
        })
    }

    pub fn send_packet(&mut self, packet: &RawPacket) -> anyhow::Result<()> {
        self.inner.send_packet(packet.packet())?;
        Ok(())
    }

    pub fn send_eof(&mut self) -> anyhow::Result<()> {
        self.inner.send_eof()?;
        Ok(())
    }

    /// `Ok(None)` when the decoder needs more input or is fully drained.
    pub fn receive_frame(&mut self) -> anyhow::Result<Option<RawVideoFrame>> {
        let mut frame = ffmpeg_next::frame::Video::empty();
        match self.inner.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(RawVideoFrame::new(frame, self.time_base))),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Decode for VideoDecoder {
    type Packet = RawPacket;
    type Frame = RawVideoFrame;

    fn send_packet(&mut self, packet: &RawPacket) -> anyhow::Result<()> {
        VideoDecoder::send_packet(self, packet)
    }

    fn send_eof(&mut self) -> anyhow::Result<()> {
        VideoDecoder::send_eof(self)
    }

    fn receive_frame(&mut self) -> anyhow::Result<Option<RawVideoFrame>> {
        VideoDecoder::receive_frame(self)
    }
}
