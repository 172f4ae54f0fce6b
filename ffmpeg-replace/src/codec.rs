//! Output encoder selection.
//!
//! A fixed preference list, best first. The first entry whose encoder is
//! registered in the linked FFmpeg build wins, together with its option set.

use ffmpeg_next::{Dictionary, format::Pixel};

use crate::error::ReplaceError;

#[derive(Debug, PartialEq, Eq)]
pub struct CodecChoice {
    pub name: &'static str,
    pub options: &'static [(&'static str, &'static str)],
}

impl CodecChoice {
    pub fn dictionary(&self) -> Dictionary<'static> {
        let mut opts = Dictionary::new();
        for (key, value) in self.options {
            opts.set(key, value);
        }
        opts
    }
}

pub const PREFERENCES: &[CodecChoice] = &[
    CodecChoice {
        name: "hevc_nvenc",
        options: &[
            ("profile", "main"),
            ("preset", "slow"),
            ("rc", "vbr"),
            ("cq", "17"),
        ],
    },
    CodecChoice {
        name: "libx265",
        options: &[("preset", "slow"), ("crf", "17")],
    },
    CodecChoice {
        name: "h264_nvenc",
        options: &[
            ("profile", "high"),
            ("preset", "slow"),
            ("rc", "vbr"),
            ("cq", "17"),
        ],
    },
    CodecChoice {
        name: "libx264",
        options: &[("profile", "high"), ("preset", "slow"), ("crf", "17")],
    },
];

/// Entries of [`PREFERENCES`] present in `available`, best first.
pub fn candidates<S: AsRef<str>>(available: &[S]) -> Vec<&'static CodecChoice> {
    PREFERENCES
        .iter()
        .filter(|choice| available.iter().any(|name| name.as_ref() == choice.name))
        .collect()
}

/// Picks the most preferred encoder present in `available`.
///
/// Geometry and pixel format are accepted so callers already pass what a
/// resolution-aware policy needs; the current table does not look at them.
pub fn select_codec<S: AsRef<str>>(
    _width: u32,
    _height: u32,
    _pixel_format: Pixel,
    available: &[S],
) -> Result<&'static CodecChoice, ReplaceError> {
    candidates(available)
        .first()
        .copied()
        .ok_or(ReplaceError::NoSuitableCodec)
}

/// Runs `open` on each candidate in order and keeps the first success.
///
/// Being registered does not mean an encoder can start: hardware encoders
/// fail to open without a device. Such failures move on to the next entry.
pub fn open_first<T>(
    candidates: &[&'static CodecChoice],
    mut open: impl FnMut(&'static CodecChoice) -> anyhow::Result<T>,
) -> Result<(&'static CodecChoice, T), ReplaceError> {
    for &choice in candidates {
        match open(choice) {
            Ok(opened) => return Ok((choice, opened)),
            Err(e) => log::warn!("encoder {} failed to open: {:#}", choice.name, e),
        }
    }
    Err(ReplaceError::NoSuitableCodec)
}

/// Names from [`PREFERENCES`] registered in the linked FFmpeg. Registration
/// only; whether the encoder opens is decided by [`open_first`].
pub fn available_encoders() -> Vec<&'static str> {
    PREFERENCES
        .iter()
        .filter(|choice| ffmpeg_next::encoder::find_by_name(choice.name).is_some())
        .map(|choice| {
            log::debug!("encoder registered: {}", choice.name);
            choice.name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_top_entry() {
        let choice = select_codec(1920, 1080, Pixel::YUV420P, &["libx264", "hevc_nvenc"]).unwrap();
        assert_eq!(choice.name, "hevc_nvenc");
        assert_eq!(
            choice.options,
            &[
                ("profile", "main"),
                ("preset", "slow"),
                ("rc", "vbr"),
                ("cq", "17")
            ]
        );
    }

    #[test]
    fn test_select_falls_back_to_lower_preference() {
        let choice = select_codec(1280, 720, Pixel::YUV420P, &["mpeg4", "libx264"]).unwrap();
        assert_eq!(choice.name, "libx264");
        assert_eq!(
            choice.options,
            &[("profile", "high"), ("preset", "slow"), ("crf", "17")]
        );
    }

    #[test]
    fn test_select_without_candidates_fails() {
        let none: [&str; 0] = [];
        let err = select_codec(640, 480, Pixel::YUV420P, &none).unwrap_err();
        assert!(matches!(err, ReplaceError::NoSuitableCodec));

        let err = select_codec(640, 480, Pixel::YUV420P, &["mpeg4"]).unwrap_err();
        assert!(matches!(err, ReplaceError::NoSuitableCodec));
    }

    #[test]
    fn test_dictionary_carries_options() {
        let opts = PREFERENCES[1].dictionary();
        assert_eq!(opts.get("preset"), Some("slow"));
        assert_eq!(opts.get("crf"), Some("17"));
    }

    #[test]
    fn test_open_first_skips_encoders_that_fail_to_open() -> anyhow::Result<()> {
        let list = candidates(&["libx264", "hevc_nvenc", "libx265"]);
        assert_eq!(
            list.iter().map(|c| c.name).collect::<Vec<_>>(),
            vec!["hevc_nvenc", "libx265", "libx264"]
        );

        let mut tried = Vec::new();
        let (choice, opened) = open_first(&list, |choice| {
            tried.push(choice.name);
            if choice.name == "hevc_nvenc" {
                anyhow::bail!("no CUDA-capable device");
            }
            Ok(choice.name.len())
        })?;
        assert_eq!(choice.name, "libx265");
        assert_eq!(opened, 7);
        assert_eq!(tried, vec!["hevc_nvenc", "libx265"]);
        Ok(())
    }

    #[test]
    fn test_open_first_all_failing() {
        let list = candidates(&["h264_nvenc"]);
        let result = open_first(&list, |_| -> anyhow::Result<()> { anyhow::bail!("open failed") });
        assert!(matches!(result, Err(ReplaceError::NoSuitableCodec)));
    }
}
