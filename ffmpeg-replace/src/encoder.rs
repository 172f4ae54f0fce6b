use ffmpeg_next::{Rational, Rescale, codec, picture};

use crate::{
    codec::CodecChoice,
    frame::RawVideoFrame,
    packet::RawPacket,
    scaler::{FrameTarget, Scaler, conform},
    sync::{Encode, Timed},
};

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub target: FrameTarget,
    pub time_base: Rational,
    pub frame_rate: Option<Rational>,
    pub global_header: bool,
}

pub struct VideoEncoder {
    inner: ffmpeg_next::codec::encoder::Video,
    codec_name: &'static str,
    target: FrameTarget,
    time_base: Rational,
    scaler: Option<Scaler>,
    conformed: u64,
}

impl VideoEncoder {
    pub fn open(choice: &CodecChoice, settings: Settings) -> anyhow::Result<Self> {
        let codec = ffmpeg_next::encoder::find_by_name(choice.name)
            .ok_or(anyhow::anyhow!("codec not found: {}", choice.name))?;
        let mut encoder = ffmpeg_next::codec::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder.set_width(settings.target.width);
        encoder.set_height(settings.target.height);
        encoder.set_format(settings.target.pixel_format);
        encoder.set_time_base(settings.time_base);
        encoder.set_frame_rate(settings.frame_rate);
        if settings.global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |= codec::flag::Flags::GLOBAL_HEADER.bits() as i32;
            }
        }

        let encoder = encoder.open_with(choice.dictionary())?;
        log::info!(
            "encoder opened: {} {}x{} {:?}, time_base {}",
            choice.name,
            settings.target.width,
            settings.target.height,
            settings.target.pixel_format,
            settings.time_base
        );

        Ok(Self {
            inner: encoder,
            codec_name: choice.name,
            target: settings.target,
            time_base: settings.time_base,
            scaler: None,
            conformed: 0,
        })
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec_name
    }

    pub fn inner(&self) -> &ffmpeg_next::codec::encoder::Video {
        &self.inner
    }

    pub fn send_frame(&mut self, frame: RawVideoFrame) -> anyhow::Result<()> {
        let pts = frame.pts();
        let time_base = frame.time_base();
        let mut video = frame.into_video();

        if video.format() != self.target.pixel_format
            || video.width() != self.target.width
            || video.height() != self.target.height
        {
            if self.conformed == 0 {
                log::warn!(
                    "replacement frame is {}x{} {:?}, conforming to {}x{} {:?} before encoding",
                    video.width(),
                    video.height(),
                    video.format(),
                    self.target.width,
                    self.target.height,
                    self.target.pixel_format
                );
            }
            self.conformed += 1;
            video = conform(&mut self.scaler, video, self.target)?;
        }

        let pts = match pts {
            Some(pts) if time_base.numerator() > 0 && time_base != self.time_base => {
                Some(pts.rescale(time_base, self.time_base))
            }
            other => other,
        };
        video.set_pts(pts);
        // Picture type left over from a decoder would force keyframes.
        video.set_kind(picture::Type::None);
        self.inner.send_frame(&video)?;
        Ok(())
    }

    pub fn send_eof(&mut self) -> anyhow::Result<()> {
        self.inner.send_eof()?;
        Ok(())
    }

    pub fn receive_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        let mut packet = ffmpeg_next::codec::packet::Packet::empty();
        match self.inner.receive_packet(&mut packet) {
            Ok(()) => Ok(Some(RawPacket::new(packet, self.time_base))),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(None)
            }
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl Encode for VideoEncoder {
    type Frame = RawVideoFrame;
    type Packet = RawPacket;

    fn send_frame(&mut self, frame: RawVideoFrame) -> anyhow::Result<()> {
        VideoEncoder::send_frame(self, frame)
    }

    fn send_eof(&mut self) -> anyhow::Result<()> {
        VideoEncoder::send_eof(self)
    }

    fn receive_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        VideoEncoder::receive_packet(self)
    }
}
