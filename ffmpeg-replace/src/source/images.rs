use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Context;
use regex::Regex;

use crate::{error::ReplaceError, frame::RawVideoFrame};

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// How many unordered file names the warning lists.
const FAILED_GUESSES_SHOWN: usize = 3;

/// Still images, one frame per file, at their native size and format.
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
    total: usize,
}

impl ImageSequence {
    pub fn open(pattern: &str) -> Result<Self, ReplaceError> {
        let paths = glob_paths(pattern)?;
        if paths.is_empty() {
            return Err(ReplaceError::NoReplacementFrames(pattern.to_string()));
        }
        let (paths, failed) = sort_numerically(paths);
        if !failed.is_empty() {
            let shown: Vec<_> = failed
                .iter()
                .take(FAILED_GUESSES_SHOWN)
                .map(|p| p.display().to_string())
                .collect();
            log::warn!(
                "frame ordering can't be determined for {} input(s): {:?}",
                failed.len(),
                shown
            );
        }
        log::info!("{} replacement images matched `{}`", paths.len(), pattern);
        Ok(Self {
            total: paths.len(),
            paths: paths.into_iter(),
        })
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn next_frame(&mut self) -> anyhow::Result<Option<RawVideoFrame>> {
        match self.paths.next() {
            Some(path) => load_frame(&path).map(Some),
            None => Ok(None),
        }
    }
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>, ReplaceError> {
    let entries = glob::glob(pattern).map_err(|e| {
        ReplaceError::UnsupportedReplacement(format!("invalid glob pattern `{}`: {}", pattern, e))
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("glob entry error for pattern {}", pattern))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// First run of digits in the file name, leading zeros stripped. Any length
/// is kept, so ordering never depends on integer width.
pub fn numeric_key(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let digits = NUMERIC.find(name)?.as_str();
    Some(digits.trim_start_matches('0'))
}

/// Stable sort by the decimal value of [`numeric_key`]. Paths without a key
/// sort first (as 0) and are returned separately for reporting.
pub fn sort_numerically(paths: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let failed: Vec<PathBuf> = paths
        .iter()
        .filter(|path| numeric_key(path).is_none())
        .cloned()
        .collect();
    let mut sorted = paths;
    sorted.sort_by(|a, b| {
        let a = numeric_key(a).unwrap_or_default();
        let b = numeric_key(b).unwrap_or_default();
        // Without leading zeros, the shorter digit string is the smaller number.
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    });
    (sorted, failed)
}

pub fn load_frame(path: &Path) -> anyhow::Result<RawVideoFrame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgb8();
    RawVideoFrame::from_rgb(&image)
}
