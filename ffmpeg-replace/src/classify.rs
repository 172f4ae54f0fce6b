//! Maps input streams onto output streams, index for index.

use ffmpeg_next::{Rational, format::Pixel};

use crate::{
    codec::{CodecChoice, select_codec},
    error::ReplaceError,
    scaler::FrameTarget,
    stream::{AvStream, StreamKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    pub index: usize,
    pub kind: StreamKind,
    pub width: u32,
    pub height: u32,
    pub time_base: Rational,
}

impl From<&AvStream> for StreamLayout {
    fn from(stream: &AvStream) -> Self {
        Self {
            index: stream.index(),
            kind: stream.kind(),
            width: stream.width(),
            height: stream.height(),
            time_base: stream.time_base(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum StreamPlan {
    /// Re-encode with `codec`. The output stream keeps the input time base.
    Encode {
        index: usize,
        codec: &'static CodecChoice,
        target: FrameTarget,
        time_base: Rational,
    },
    /// Structural copy of the input stream.
    Copy { index: usize },
}

impl StreamPlan {
    pub fn index(&self) -> usize {
        match self {
            StreamPlan::Encode { index, .. } | StreamPlan::Copy { index } => *index,
        }
    }
}

pub fn scale_dimension(value: u32, scale: f64) -> u32 {
    (value as f64 * scale).round() as u32
}

/// Index of the one video stream. Zero or several is a precondition failure.
pub fn find_video_stream(streams: &[StreamLayout]) -> Result<usize, ReplaceError> {
    let mut video = streams.iter().filter(|s| s.kind == StreamKind::Video);
    match (video.next(), video.count()) {
        (None, _) => Err(ReplaceError::NoVideoStream),
        (Some(stream), 0) => Ok(stream.index),
        (Some(_), rest) => Err(ReplaceError::MultipleVideoStreams(rest + 1)),
    }
}

/// Output geometry for the video stream.
pub fn video_target(video: &StreamLayout, vscale: f64, pixel_format: Pixel) -> FrameTarget {
    FrameTarget {
        width: scale_dimension(video.width, vscale),
        height: scale_dimension(video.height, vscale),
        pixel_format,
    }
}

pub fn plan_streams<S: AsRef<str>>(
    streams: &[StreamLayout],
    vscale: f64,
    pixel_format: Pixel,
    available_encoders: &[S],
) -> Result<Vec<StreamPlan>, ReplaceError> {
    find_video_stream(streams)?;
    streams
        .iter()
        .map(|stream| match stream.kind {
            StreamKind::Video => {
                let target = video_target(stream, vscale, pixel_format);
                let codec = select_codec(
                    target.width,
                    target.height,
                    target.pixel_format,
                    available_encoders,
                )?;
                Ok(StreamPlan::Encode {
                    index: stream.index,
                    codec,
                    target,
                    time_base: stream.time_base,
                })
            }
            StreamKind::Other => Ok(StreamPlan::Copy {
                index: stream.index,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(index: usize, kind: StreamKind) -> StreamLayout {
        StreamLayout {
            index,
            kind,
            width: if kind == StreamKind::Video { 1280 } else { 0 },
            height: if kind == StreamKind::Video { 720 } else { 0 },
            time_base: Rational::new(1, 12800),
        }
    }

    #[test]
    fn test_scale_dimension_rounds() {
        assert_eq!(scale_dimension(1280, 1.0), 1280);
        assert_eq!(scale_dimension(1280, 1.5), 1920);
        assert_eq!(scale_dimension(853, 0.5), 427);
        assert_eq!(scale_dimension(720, 2.0), 1440);
    }

    #[test]
    fn test_find_video_stream() {
        let streams = [layout(0, StreamKind::Other), layout(1, StreamKind::Video)];
        assert_eq!(find_video_stream(&streams).unwrap(), 1);

        let none = [layout(0, StreamKind::Other)];
        assert!(matches!(find_video_stream(&none), Err(ReplaceError::NoVideoStream)));

        let two = [
            layout(0, StreamKind::Video),
            layout(1, StreamKind::Other),
            layout(2, StreamKind::Video),
        ];
        assert!(matches!(
            find_video_stream(&two),
            Err(ReplaceError::MultipleVideoStreams(2))
        ));
    }

    #[test]
    fn test_plan_keeps_index_and_time_base() -> anyhow::Result<()> {
        let streams = [
            layout(0, StreamKind::Video),
            layout(1, StreamKind::Other),
            layout(2, StreamKind::Other),
        ];
        let plans = plan_streams(&streams, 2.0, Pixel::YUV420P10LE, &["libx264"])?;

        assert_eq!(plans.len(), 3);
        assert_eq!(
            plans.iter().map(StreamPlan::index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        match &plans[0] {
            StreamPlan::Encode {
                codec,
                target,
                time_base,
                ..
            } => {
                assert_eq!(codec.name, "libx264");
                assert_eq!(target.width, 2560);
                assert_eq!(target.height, 1440);
                assert_eq!(target.pixel_format, Pixel::YUV420P10LE);
                assert_eq!(*time_base, Rational::new(1, 12800));
            }
            other => panic!("expected encode plan, got {:?}", other),
        }
        assert_eq!(plans[1], StreamPlan::Copy { index: 1 });
        assert_eq!(plans[2], StreamPlan::Copy { index: 2 });
        Ok(())
    }

    #[test]
    fn test_plan_without_codec_fails() {
        let streams = [layout(0, StreamKind::Video)];
        let none: [&str; 0] = [];
        assert!(matches!(
            plan_streams(&streams, 1.0, Pixel::YUV420P, &none),
            Err(ReplaceError::NoSuitableCodec)
        ));
    }
}
