//! Frame synchronization engine.
//!
//! ```text
//!  demux ──► packet ──┬─ no dts ────────────────► dropped
//!                     ├─ other stream ──────────► mux (index rebound only)
//!                     └─ video ─► decode ─► original frame
//!                                                │  pts + time base
//!  replacement source ─► prefetch ─► frame ◄─────┘
//!                                      │
//!                                      └─► encode ─► packets ─► mux
//! ```
//!
//! Pairing follows the cadence of the original stream: every decoded
//! original frame consumes exactly one replacement frame, so the output has
//! as many video frames as the input.

use ffmpeg_next::Rational;
use indicatif::ProgressBar;

use crate::error::ReplaceError;

/// Timing carried by a decoded frame.
pub trait Timed {
    fn pts(&self) -> Option<i64>;
    fn time_base(&self) -> Rational;
    fn set_timing(&mut self, pts: Option<i64>, time_base: Rational);
}

pub trait StreamPacket {
    fn stream_index(&self) -> usize;
    fn dts(&self) -> Option<i64>;
    fn set_stream_index(&mut self, index: usize);
}

pub trait Demux {
    type Packet: StreamPacket;
    /// `Ok(None)` at end of input.
    fn read_packet(&mut self) -> anyhow::Result<Option<Self::Packet>>;
}

pub trait Decode {
    type Packet;
    type Frame: Timed;
    fn send_packet(&mut self, packet: &Self::Packet) -> anyhow::Result<()>;
    fn send_eof(&mut self) -> anyhow::Result<()>;
    /// `Ok(None)` when more input is needed or the decoder is drained.
    fn receive_frame(&mut self) -> anyhow::Result<Option<Self::Frame>>;
}

pub trait Encode {
    type Frame: Timed;
    type Packet: StreamPacket;
    fn send_frame(&mut self, frame: Self::Frame) -> anyhow::Result<()>;
    fn send_eof(&mut self) -> anyhow::Result<()>;
    fn receive_packet(&mut self) -> anyhow::Result<Option<Self::Packet>>;
}

pub trait Mux {
    type Packet;
    fn write_packet(&mut self, packet: Self::Packet) -> anyhow::Result<()>;
    /// Flushes interleaving buffers and writes the trailer.
    fn finish(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
    /// Input exhausted; decoder and encoder are being flushed.
    Draining,
    Done,
    Failed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Original frames paired with a replacement and encoded.
    pub frames: u64,
    pub video_packets: u64,
    pub passthrough_packets: u64,
    /// Packets without a decode timestamp.
    pub dropped_packets: u64,
}

pub struct FrameSync<D, V, E, M> {
    demux: D,
    decoder: V,
    encoder: E,
    mux: M,
    video_index: usize,
    state: SyncState,
    report: SyncReport,
    progress: ProgressBar,
}

impl<D, V, E, M> FrameSync<D, V, E, M>
where
    D: Demux,
    V: Decode<Packet = D::Packet>,
    E: Encode<Packet = D::Packet>,
    M: Mux<Packet = D::Packet>,
{
    /// `video_index` is both the input video stream and the output stream
    /// its re-encoded packets are bound to.
    pub fn new(demux: D, decoder: V, encoder: E, mux: M, video_index: usize) -> Self {
        Self {
            demux,
            decoder,
            encoder,
            mux,
            video_index,
            state: SyncState::Idle,
            report: SyncReport::default(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn report(&self) -> SyncReport {
        self.report
    }

    pub fn muxer(&self) -> &M {
        &self.mux
    }

    /// Drives the whole run. Replacement frames are pulled from
    /// `replacements` one per original frame, in order.
    ///
    /// On any failure the encoder is flushed and the output finished, so
    /// everything paired so far stays playable.
    pub fn run<R>(&mut self, replacements: &mut R) -> Result<SyncReport, ReplaceError>
    where
        R: Iterator<Item = anyhow::Result<E::Frame>>,
    {
        self.set_state(SyncState::Running);
        match self.drive(replacements) {
            Ok(()) => {
                self.set_state(SyncState::Done);
                Ok(self.report)
            }
            Err(err) => {
                self.set_state(SyncState::Failed);
                self.abandon();
                Err(err)
            }
        }
    }

    fn drive<R>(&mut self, replacements: &mut R) -> Result<(), ReplaceError>
    where
        R: Iterator<Item = anyhow::Result<E::Frame>>,
    {
        while let Some(mut packet) = self.demux.read_packet()? {
            if packet.dts().is_none() {
                self.report.dropped_packets += 1;
                continue;
            }

            let index = packet.stream_index();
            if index != self.video_index {
                // Output streams mirror input streams 1:1.
                packet.set_stream_index(index);
                self.mux.write_packet(packet)?;
                self.report.passthrough_packets += 1;
                continue;
            }

            self.decoder.send_packet(&packet)?;
            self.drain_decoder(replacements)?;
        }

        self.set_state(SyncState::Draining);
        self.decoder.send_eof()?;
        self.drain_decoder(replacements)?;
        self.encoder.send_eof()?;
        self.drain_encoder()?;
        self.mux.finish()?;
        Ok(())
    }

    fn drain_decoder<R>(&mut self, replacements: &mut R) -> Result<(), ReplaceError>
    where
        R: Iterator<Item = anyhow::Result<E::Frame>>,
    {
        while let Some(original) = self.decoder.receive_frame()? {
            self.pair(original, replacements)?;
        }
        Ok(())
    }

    fn pair<R>(&mut self, original: V::Frame, replacements: &mut R) -> Result<(), ReplaceError>
    where
        R: Iterator<Item = anyhow::Result<E::Frame>>,
    {
        let frame_index = self.report.frames + 1;
        let mut replacement = match replacements.next() {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                return Err(ReplaceError::Replacement(
                    err.context(format!("replacement for frame_index {}", frame_index)),
                ));
            }
            None => return Err(ReplaceError::ReplacementExhausted { frame: frame_index }),
        };
        replacement.set_timing(original.pts(), original.time_base());

        self.encoder.send_frame(replacement)?;
        self.drain_encoder()?;
        self.report.frames = frame_index;
        self.progress.inc(1);
        Ok(())
    }

    fn drain_encoder(&mut self) -> anyhow::Result<()> {
        while let Some(mut packet) = self.encoder.receive_packet()? {
            packet.set_stream_index(self.video_index);
            self.mux.write_packet(packet)?;
            self.report.video_packets += 1;
        }
        Ok(())
    }

    /// Best-effort close after a fatal error. Failures here are logged; the
    /// error that stopped the run is the one reported.
    fn abandon(&mut self) {
        let flushed = self
            .encoder
            .send_eof()
            .and_then(|_| self.drain_encoder());
        if let Err(e) = flushed {
            log::warn!("flushing encoder after failure: {:#}", e);
        }
        if let Err(e) = self.mux.finish() {
            log::warn!("finishing output after failure: {:#}", e);
        }
        log::info!(
            "output truncated after {} frames ({} video packets)",
            self.report.frames,
            self.report.video_packets
        );
    }

    fn set_state(&mut self, state: SyncState) {
        log::debug!("sync state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;
