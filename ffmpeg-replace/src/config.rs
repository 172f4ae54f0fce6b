use std::path::{Path, PathBuf};

use ffmpeg_next::format::Pixel;

use crate::{error::ReplaceError, prefetch};

/// Where replacement frames come from. Decided once, up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementSpec {
    /// Still images matched by a glob pattern, ordered numerically.
    Images { pattern: String },
    /// Frames decoded from a secondary container.
    Video { path: PathBuf },
    /// `-`: frames streamed on stdin.
    Pipe,
    Unsupported(String),
}

impl ReplacementSpec {
    pub fn parse(desc: &str) -> Self {
        if desc == "-" {
            ReplacementSpec::Pipe
        } else if Path::new(desc).is_file() {
            // An existing file wins even if its name holds glob metacharacters.
            ReplacementSpec::Video {
                path: PathBuf::from(desc),
            }
        } else if desc.contains(['*', '?', '[']) {
            ReplacementSpec::Images {
                pattern: desc.to_string(),
            }
        } else {
            ReplacementSpec::Unsupported(desc.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub replacement: ReplacementSpec,
    pub output: PathBuf,
    pub overwrite: bool,
    pub vscale: f64,
    pub pixel_format: Pixel,
    /// Prefetch queue capacity.
    pub prefetch: usize,
    /// Decoder threads, 0 = let FFmpeg decide.
    pub decode_threads: usize,
    pub progress: bool,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, replacement: &str, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            replacement: ReplacementSpec::parse(replacement),
            output: output.into(),
            overwrite: false,
            vscale: 1.0,
            pixel_format: Pixel::YUV420P,
            prefetch: prefetch::DEFAULT_CAPACITY,
            decode_threads: 0,
            progress: false,
        }
    }

    pub fn validate(&self) -> Result<(), ReplaceError> {
        if !self.vscale.is_finite() || self.vscale <= 0.0 {
            return Err(ReplaceError::InvalidArgument(format!(
                "vscale must be a positive number, got {}",
                self.vscale
            )));
        }
        if self.prefetch == 0 {
            return Err(ReplaceError::InvalidArgument(
                "prefetch capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse_pixel_format(name: &str) -> Result<Pixel, ReplaceError> {
    match name.parse::<Pixel>() {
        Ok(Pixel::None) | Err(_) => Err(ReplaceError::InvalidArgument(format!(
            "unknown pixel format `{}`",
            name
        ))),
        Ok(pixel) => Ok(pixel),
    }
}
