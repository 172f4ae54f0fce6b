use ffmpeg_next::{Rational, codec::packet::Packet};

use crate::sync::StreamPacket;

/// Compressed packet tagged with the time base its timestamps use. Demuxed
/// packets carry their input stream's time base, encoded ones the encoder's.
#[derive(Clone)]
pub struct RawPacket {
    inner: Packet,
    time_base: Rational,
}

impl RawPacket {
    pub fn new(inner: Packet, time_base: Rational) -> Self {
        Self { inner, time_base }
    }

    pub fn index(&self) -> usize {
        self.inner.stream()
    }

    pub fn pts(&self) -> Option<i64> {
        self.inner.pts()
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn packet(&self) -> &Packet {
        &self.inner
    }

    pub fn packet_mut(&mut self) -> &mut Packet {
        &mut self.inner
    }
}

impl StreamPacket for RawPacket {
    fn stream_index(&self) -> usize {
        self.index()
    }

    fn dts(&self) -> Option<i64> {
        self.inner.dts()
    }

    fn set_stream_index(&mut self, index: usize) {
        self.inner.set_stream(index);
    }
}
