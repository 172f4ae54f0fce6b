use std::path::Path;

use anyhow::Context;
use ffmpeg_next::Rational;

use crate::{encoder::VideoEncoder, packet::RawPacket, stream::AvStream, sync::Mux};

pub struct AvOutput {
    inner: ffmpeg_next::format::context::Output,
    have_written_header: bool,
    have_written_trailer: bool,
}

impl AvOutput {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let output = ffmpeg_next::format::output(&path)
            .with_context(|| format!("failed to create output {}", path.display()))?;
        Ok(Self {
            inner: output,
            have_written_header: false,
            have_written_trailer: false,
        })
    }

    /// Whether encoders feeding this container must emit global headers.
    pub fn needs_global_header(&self) -> bool {
        self.inner
            .format()
            .flags()
            .contains(ffmpeg_next::format::flag::Flags::GLOBAL_HEADER)
    }

    /// Adds a stream templated on `stream`: same codec parameters and time
    /// base, packets are copied without re-encoding.
    pub fn add_copy_stream(&mut self, stream: &AvStream) -> anyhow::Result<usize> {
        let mut writer_stream = self
            .inner
            .add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        writer_stream.set_parameters(stream.parameters().clone());
        writer_stream.set_time_base(stream.time_base());
        unsafe {
            // The source container's codec tag may be invalid in the target one.
            (*writer_stream.parameters().as_mut_ptr()).codec_tag = 0;
        }
        Ok(writer_stream.index())
    }

    /// Adds a stream fed by `encoder`, stamped with `time_base`.
    pub fn add_video_stream(
        &mut self,
        encoder: &VideoEncoder,
        time_base: Rational,
    ) -> anyhow::Result<usize> {
        let codec = ffmpeg_next::encoder::find_by_name(encoder.codec_name());
        let mut writer_stream = self.inner.add_stream(codec)?;
        writer_stream.set_parameters(encoder.inner());
        writer_stream.set_time_base(time_base);
        Ok(writer_stream.index())
    }

    fn stream_time_base(&self, stream_index: usize) -> anyhow::Result<Rational> {
        self.inner
            .stream(stream_index)
            .map(|s| s.time_base())
            .ok_or_else(|| anyhow::anyhow!("stream not found: {}", stream_index))
    }

    /// Writes `packet` to the output stream it is bound to, rescaling its
    /// timestamps into that stream's time base. The rescale is an identity
    /// unless the muxer replaced the time base while writing the header.
    pub fn write_packet(&mut self, mut packet: RawPacket) -> anyhow::Result<()> {
        if !self.have_written_header {
            self.inner.write_header()?;
            self.have_written_header = true;
        }
        let time_base = packet.time_base();
        let out_time_base = self.stream_time_base(packet.index())?;

        let p = packet.packet_mut();
        p.set_position(-1);
        if time_base != out_time_base {
            p.rescale_ts(time_base, out_time_base);
        }
        p.write_interleaved(&mut self.inner)?;
        Ok(())
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        if !self.have_written_header {
            // Nothing muxed yet: still produce a valid, empty container.
            self.inner.write_header()?;
            self.have_written_header = true;
        }
        if !self.have_written_trailer {
            self.have_written_trailer = true;
            self.inner.write_trailer()?;
        }
        Ok(())
    }
}

impl Mux for AvOutput {
    type Packet = RawPacket;

    fn write_packet(&mut self, packet: RawPacket) -> anyhow::Result<()> {
        AvOutput::write_packet(self, packet)
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        AvOutput::finish(self)
    }
}
