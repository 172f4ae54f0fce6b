//! One replacement run, from opening the input to the leftover check.

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    classify::{StreamLayout, StreamPlan, find_video_stream, plan_streams},
    codec::{available_encoders, candidates, open_first},
    config::RunConfig,
    decoder::VideoDecoder,
    encoder::{Settings, VideoEncoder},
    error::ReplaceError,
    input::AvInput,
    metadata::VideoProbe,
    output::AvOutput,
    prefetch::Prefetch,
    source::{ReplacementSource, SourceConfig},
    sync::{FrameSync, SyncReport},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub report: SyncReport,
    pub codec: &'static str,
    /// The replacement source still had frames after the last original frame.
    pub leftover: bool,
}

pub fn run(config: &RunConfig) -> Result<RunSummary, ReplaceError> {
    config.validate()?;
    if config.output.exists() && !config.overwrite {
        return Err(ReplaceError::OutputExists(config.output.clone()));
    }

    let input = AvInput::open(&config.input)?;
    let layouts: Vec<StreamLayout> = input.streams().iter().map(StreamLayout::from).collect();
    let video_index = find_video_stream(&layouts)?;
    let video_stream = input
        .stream(video_index)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("video stream {} missing", video_index))?;
    let probe = VideoProbe::from(&video_stream);
    log::info!(
        "{} ({}, {} streams)\n{}",
        config.input.display(),
        input.format_name(),
        layouts.len(),
        probe
    );

    let encoders = available_encoders();
    log::debug!("available encoders: {:?}", encoders);
    let plans = plan_streams(&layouts, config.vscale, config.pixel_format, &encoders)?;
    let (target, time_base) = plans
        .iter()
        .find_map(|plan| match plan {
            StreamPlan::Encode {
                target, time_base, ..
            } => Some((*target, *time_base)),
            StreamPlan::Copy { .. } => None,
        })
        .ok_or(ReplaceError::NoVideoStream)?;

    let source = ReplacementSource::open(
        &config.replacement,
        SourceConfig {
            target,
            decode_threads: config.decode_threads,
        },
    )?;
    log::info!("replacement source: {}", source.kind());
    check_frame_counts(probe.frames, source.expected_frames());

    let mut output = AvOutput::create(&config.output)?;
    let frame_rate = probe.frame_rate;
    let settings = Settings {
        target,
        time_base,
        frame_rate: (frame_rate.numerator() > 0).then_some(frame_rate),
        global_header: output.needs_global_header(),
    };
    let (codec, encoder) =
        match open_first(&candidates(&encoders), |choice| VideoEncoder::open(choice, settings)) {
            Ok(opened) => opened,
            Err(e) => {
                // Nothing was written; don't leave an empty container behind.
                drop(output);
                if let Err(rm) = std::fs::remove_file(&config.output) {
                    log::debug!("removing {}: {}", config.output.display(), rm);
                }
                return Err(e);
            }
        };
    for plan in &plans {
        let index = match plan {
            StreamPlan::Encode { time_base, .. } => output.add_video_stream(&encoder, *time_base)?,
            StreamPlan::Copy { index } => {
                let stream = input
                    .stream(*index)
                    .ok_or_else(|| anyhow::anyhow!("input stream {} missing", index))?;
                output.add_copy_stream(stream)?
            }
        };
        if index != plan.index() {
            return Err(anyhow::anyhow!(
                "output stream {} created for input stream {}",
                index,
                plan.index()
            )
            .into());
        }
    }

    let decoder = VideoDecoder::new(&video_stream, config.decode_threads)?;
    let mut replacements = Prefetch::spawn(source, config.prefetch)?;
    let progress = progress_bar(probe.frames, config.progress)?;

    let mut sync = FrameSync::new(input, decoder, encoder, output, video_index)
        .with_progress(progress.clone());
    let result = sync.run(&mut replacements);
    // Closes both containers before the leftover check.
    drop(sync);
    progress.finish_and_clear();
    let report = result?;

    let leftover = replacements.next().is_some();
    if leftover {
        log::warn!("not all replacement frames were used");
    }
    Ok(RunSummary {
        report,
        codec: codec.name,
        leftover,
    })
}

/// Advisory only: a mismatch is logged and the run goes ahead.
pub fn check_frame_counts(original: Option<u64>, replacement: Option<u64>) -> bool {
    match (original, replacement) {
        (Some(original), Some(replacement)) if original != replacement => {
            log::warn!(
                "frame count mismatch: input video has {} frames, replacement has {}",
                original,
                replacement
            );
            false
        }
        _ => true,
    }
}

fn progress_bar(frames: Option<u64>, enabled: bool) -> anyhow::Result<ProgressBar> {
    if !enabled {
        return Ok(ProgressBar::hidden());
    }
    let bar = match frames {
        Some(n) => {
            let bar = ProgressBar::new(n);
            bar.set_style(
                ProgressStyle::with_template(
                    "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({per_sec}, eta {eta})",
                )?
                .progress_chars("=> "),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {pos} frames ({per_sec})",
            )?);
            bar
        }
    };
    Ok(bar)
}

#[cfg(test)]
#[path = "replace_test.rs"]
mod replace_test;
