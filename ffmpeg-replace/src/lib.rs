/// Registers FFmpeg components. Call once at startup before opening any
/// container.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))
}

pub mod classify;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
#[cfg(test)]
mod fixture;
pub mod frame;
pub mod input;
pub mod metadata;
pub mod output;
pub mod packet;
pub mod prefetch;
pub mod replace;
pub mod scaler;
pub mod source;
pub mod stream;
pub mod sync;

pub use error::ReplaceError;
