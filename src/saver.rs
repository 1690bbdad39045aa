//! Saving frames to disk under the label-based filename scheme.

use std::path::{Path, PathBuf};

use image::{ExtendedColorType, ImageFormat};
use thiserror::Error;

use crate::labels::LabelSet;
use crate::source::Frame;

/// Errors from creating the output directory or writing an image.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to create output directory '{}': {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No label at index {0}")]
    InvalidLabel(usize),
    #[error("Failed to write '{}': {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Writes frames as JPEG files and tracks how many have been saved per label.
///
/// Counters start at zero every run and only ever count this process's own
/// writes; filenames are not checked against pre-existing files, so a
/// non-empty output directory from an earlier run will be overwritten from
/// `-000` up.
pub struct FrameSaver {
    output_dir: PathBuf,
    labels: LabelSet,
    counts: Vec<u64>,
}

impl FrameSaver {
    /// Create a saver for `output_dir`, creating the directory (and parents)
    /// if it does not exist. Creation is idempotent.
    pub fn create(output_dir: impl Into<PathBuf>, labels: LabelSet) -> Result<Self, SaveError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|source| SaveError::CreateDirFailed {
            path: output_dir.clone(),
            source,
        })?;
        let counts = vec![0; labels.len()];
        Ok(Self {
            output_dir,
            labels,
            counts,
        })
    }

    /// Save `frame` under the label at `index`.
    ///
    /// Returns the path written. The label's counter is incremented only
    /// after the write succeeds, so a failed write leaves the next save
    /// targeting the same filename.
    pub fn save(&mut self, frame: &Frame, index: usize) -> Result<PathBuf, SaveError> {
        let label = self
            .labels
            .get(index)
            .ok_or(SaveError::InvalidLabel(index))?;
        let path = self.output_dir.join(filename_for(label, self.counts[index]));

        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
            ImageFormat::Jpeg,
        )
        .map_err(|source| SaveError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        self.counts[index] += 1;
        Ok(path)
    }

    /// Per-label save counts, in label order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total frames saved this run.
    pub fn total_saved(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// The labels this saver writes under.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// The directory files are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Build the filename for the next save of `label`.
///
/// The counter is zero-padded to a minimum of three digits; four-digit and
/// larger counts render in full.
fn filename_for(label: &str, count: u64) -> String {
    format!("{}-{:03}.jpg", label, count)
}
