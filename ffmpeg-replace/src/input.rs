use std::path::Path;

use anyhow::Context;

use crate::{packet::RawPacket, stream::AvStream, sync::Demux};

pub struct AvInput {
    inner: ffmpeg_next::format::context::Input,
    streams: Vec<AvStream>,
}

impl AvInput {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let input = ffmpeg_next::format::input(&path)
            .with_context(|| format!("failed to open input {}", path.display()))?;
        let streams = input.streams().map(AvStream::from).collect();
        Ok(Self {
            inner: input,
            streams,
        })
    }

    /// Streams in container order; position equals stream index.
    pub fn streams(&self) -> &[AvStream] {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Option<&AvStream> {
        self.streams.get(index)
    }

    pub fn format_name(&self) -> String {
        self.inner.format().name().to_string()
    }

    /// Reads the next packet in demux order. `Ok(None)` at end of input.
    pub fn read_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        loop {
            let mut packet = ffmpeg_next::codec::packet::Packet::empty();
            match packet.read(&mut self.inner) {
                Ok(()) => {
                    let time_base = self
                        .streams
                        .get(packet.stream())
                        .map(|s| s.time_base())
                        .ok_or_else(|| anyhow::anyhow!("packet for unknown stream {}", packet.stream()))?;
                    return Ok(Some(RawPacket::new(packet, time_base)));
                }
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::util::error::EAGAIN =>
                {
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Demux for AvInput {
    type Packet = RawPacket;

    fn read_packet(&mut self) -> anyhow::Result<Option<RawPacket>> {
        AvInput::read_packet(self)
    }
}
