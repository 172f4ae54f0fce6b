use std::path::PathBuf;

/// Run-level failures. Each variant maps onto a process exit status through
/// [`ReplaceError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum ReplaceError {
    #[error("can't find video stream in input file")]
    NoVideoStream,
    #[error("more than one video stream found in input file, found {0}")]
    MultipleVideoStreams(usize),
    #[error("output {} exists, specify `-y` or `--yes` to overwrite it", .0.display())]
    OutputExists(PathBuf),
    #[error("0 replacement frames found with glob pattern `{0}`")]
    NoReplacementFrames(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported replacement method: {0}")]
    UnsupportedReplacement(String),
    #[error("pipe replacement not implemented")]
    PipeReplacement,
    #[error("no suitable codec available")]
    NoSuitableCodec,
    #[error("run out of replacement frames at frame_index {frame}")]
    ReplacementExhausted { frame: u64 },
    #[error("replacement frame failed: {0:#}")]
    Replacement(anyhow::Error),
    #[error(transparent)]
    Media(#[from] anyhow::Error),
}

impl ReplaceError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ReplaceError::NoVideoStream
            | ReplaceError::MultipleVideoStreams(_)
            | ReplaceError::OutputExists(_)
            | ReplaceError::NoReplacementFrames(_)
            | ReplaceError::InvalidArgument(_) => 1,
            ReplaceError::ReplacementExhausted { .. }
            | ReplaceError::UnsupportedReplacement(_)
            | ReplaceError::PipeReplacement => 2,
            ReplaceError::NoSuitableCodec => 3,
            ReplaceError::Replacement(_) | ReplaceError::Media(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ReplaceError::NoVideoStream.exit_code(), 1);
        assert_eq!(ReplaceError::MultipleVideoStreams(2).exit_code(), 1);
        assert_eq!(ReplaceError::OutputExists("out.mkv".into()).exit_code(), 1);
        assert_eq!(
            ReplaceError::NoReplacementFrames("*.png".to_string()).exit_code(),
            1
        );
        assert_eq!(
            ReplaceError::ReplacementExhausted { frame: 3 }.exit_code(),
            2
        );
        assert_eq!(ReplaceError::PipeReplacement.exit_code(), 2);
        assert_eq!(ReplaceError::NoSuitableCodec.exit_code(), 3);
        assert_eq!(
            ReplaceError::Replacement(anyhow::anyhow!("bad png")).exit_code(),
            4
        );
    }

    #[test]
    fn test_exhaustion_message_names_frame() {
        let err = ReplaceError::ReplacementExhausted { frame: 42 };
        assert_eq!(err.to_string(), "run out of replacement frames at frame_index 42");
    }
}
