use std::{ffi::OsString, path::PathBuf};

use clap::Parser;
use ffmpeg_replace::{
    ReplaceError,
    config::{RunConfig, parse_pixel_format},
    prefetch,
};

/// Single-dash long flags accepted for compatibility, and their clap spelling.
const LEGACY_FLAGS: [(&str, &str); 2] = [("-vs", "--vscale"), ("-vpix_fmt", "--vpix_fmt")];

/// Replace the video stream of a container with frames from an image
/// sequence or another video, keeping every other stream as is.
#[derive(Debug, Parser)]
#[command(name = "frame-replace", version, about)]
pub struct Args {
    /// Input container
    #[arg(short, long)]
    pub input: PathBuf,

    /// Replacement frames: a glob pattern (frames/*.png) or a video file
    #[arg(short, long)]
    pub replacement: String,

    /// Output container
    #[arg(short, long)]
    pub output: PathBuf,

    /// Overwrite the output if it exists
    #[arg(short = 'y', long = "yes")]
    pub overwrite: bool,

    /// Scale factor applied to the input video size (alias: -vs)
    #[arg(long, default_value_t = 1.0)]
    pub vscale: f64,

    /// Output pixel format (alias: -vpix_fmt)
    #[arg(long = "vpix_fmt", default_value = "yuv420p")]
    pub vpix_fmt: String,

    /// Replacement frames decoded ahead of the encoder
    #[arg(long, default_value_t = prefetch::DEFAULT_CAPACITY)]
    pub prefetch: usize,

    /// Decoder threads, 0 = auto
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn into_config(self) -> Result<RunConfig, ReplaceError> {
        let mut config = RunConfig::new(self.input, &self.replacement, self.output);
        config.overwrite = self.overwrite;
        config.vscale = self.vscale;
        config.pixel_format = parse_pixel_format(&self.vpix_fmt)?;
        config.prefetch = self.prefetch;
        config.decode_threads = self.threads;
        config.progress = !self.no_progress;
        config.validate()?;
        Ok(config)
    }
}

/// Rewrites `-vs` / `-vpix_fmt` (and their `=value` forms) to the long
/// flags clap understands.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            for (legacy, long) in LEGACY_FLAGS {
                if text == legacy {
                    return OsString::from(long);
                }
                if let Some(value) = text.strip_prefix(legacy).and_then(|v| v.strip_prefix('=')) {
                    return OsString::from(format!("{}={}", long, value));
                }
            }
            arg
        })
        .collect()
}
