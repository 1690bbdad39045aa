//! The capture loop controller.
//!
//! Drives the read -> preview -> wait-for-key -> act cycle until the quit
//! key, end of stream, or a read failure. Resource release is RAII on every
//! exit path: the terminal through [`RawModeGuard`], the capture source
//! through its `Drop` impl.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::input::{classify_key, wait_for_key, KeyAction};
use crate::labels::LabelSet;
use crate::preview::Preview;
use crate::saver::{FrameSaver, SaveError};
use crate::source::{CaptureSource, FrameRead, SourceError, SourceSelector};
use crate::terminal::RawModeGuard;

/// Everything the controller needs, resolved from CLI + config by `main`.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub selector: SourceSelector,
    pub labels: LabelSet,
    /// Per-frame key wait in milliseconds; 0 blocks until a key (frame
    /// stepping for video files)
    pub delay_ms: u64,
    pub output_dir: PathBuf,
    /// Mirror the preview horizontally (saved frames are unaffected)
    pub mirror: bool,
    /// Invert preview brightness for light terminals
    pub invert: bool,
}

/// Why the capture loop stopped.
#[derive(Debug)]
pub enum StopReason {
    /// The operator pressed the quit key
    QuitKey,
    /// The video file ran out of frames
    EndOfStream,
    /// The source stopped producing readable frames
    ReadError(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::QuitKey => write!(f, "quit key"),
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::ReadError(msg) => write!(f, "read error: {}", msg),
        }
    }
}

/// Summary of a finished capture run.
#[derive(Debug)]
pub struct RunStats {
    pub frames_shown: u64,
    pub frames_saved: u64,
    /// (label, saves) pairs in label order
    pub per_label: Vec<(String, u64)>,
    pub stop: StopReason,
}

/// Errors that end a run before or outside the capture loop.
#[derive(Debug)]
pub enum ControllerError {
    /// The capture source could not be opened
    Source(SourceError),
    /// The output directory could not be created
    Setup(SaveError),
    /// Terminal setup or rendering failed
    Terminal(io::Error),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Source(e) => write!(f, "{}", e),
            ControllerError::Setup(e) => write!(f, "{}", e),
            ControllerError::Terminal(e) => write!(f, "Terminal error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControllerError::Source(e) => Some(e),
            ControllerError::Setup(e) => Some(e),
            ControllerError::Terminal(e) => Some(e),
        }
    }
}

impl From<SourceError> for ControllerError {
    fn from(e: SourceError) -> Self {
        ControllerError::Source(e)
    }
}

impl From<SaveError> for ControllerError {
    fn from(e: SaveError) -> Self {
        ControllerError::Setup(e)
    }
}

/// Owns the capture source, the saver, and the preview for one run.
pub struct CaptureController {
    source: CaptureSource,
    saver: FrameSaver,
    preview: Preview,
    delay_ms: u64,
}

impl CaptureController {
    /// Open the source and prepare the output directory, failing fast if
    /// either is unavailable.
    pub fn new(options: CaptureOptions) -> Result<Self, ControllerError> {
        let source = CaptureSource::open(&options.selector)?;
        let saver = FrameSaver::create(options.output_dir, options.labels)?;
        let preview = Preview::new(options.mirror, options.invert);
        Ok(Self {
            source,
            saver,
            preview,
            delay_ms: options.delay_ms,
        })
    }

    /// Run the capture loop until it stops.
    ///
    /// Save failures are reported on the status line and do not stop the
    /// loop; read failures and end of stream do.
    pub fn run(&mut self) -> Result<RunStats, ControllerError> {
        let guard = RawModeGuard::enter().map_err(ControllerError::Terminal)?;
        let mut stdout = io::stdout();
        let mut frames_shown: u64 = 0;
        let mut note: Option<String> = None;

        let stop = loop {
            let frame = match self.source.read() {
                Ok(FrameRead::Frame(frame)) => frame,
                Ok(FrameRead::EndOfStream) => break StopReason::EndOfStream,
                Err(e) => {
                    log::error!("{}", e);
                    break StopReason::ReadError(e.to_string());
                }
            };
            frames_shown += 1;

            let status = status_line(
                self.saver.labels(),
                self.saver.counts(),
                note.as_deref(),
            );
            self.preview
                .render(&mut stdout, &frame, &status)
                .map_err(ControllerError::Terminal)?;

            let Some(key) = wait_for_key(self.delay_ms).map_err(ControllerError::Terminal)? else {
                continue;
            };

            match classify_key(&key, self.saver.labels().len()) {
                KeyAction::Quit => break StopReason::QuitKey,
                KeyAction::Save(index) => match self.saver.save(&frame, index) {
                    Ok(path) => {
                        log::info!("saved {}", path.display());
                        note = Some(format!("saved {}", path.display()));
                    }
                    Err(e) => {
                        // Counter was not incremented; keep capturing
                        log::error!("save failed: {}", e);
                        note = Some(format!("save failed: {}", e));
                    }
                },
                KeyAction::Ignore => {}
            }
        };

        drop(guard);
        log::info!("capture stopped: {}", stop);

        let per_label = self
            .saver
            .labels()
            .iter()
            .map(String::from)
            .zip(self.saver.counts().iter().copied())
            .collect();

        Ok(RunStats {
            frames_shown,
            frames_saved: self.saver.total_saved(),
            per_label,
            stop,
        })
    }
}

/// Format the status line: key bindings with live per-label counts, the quit
/// hint, and the most recent save result.
fn status_line(labels: &LabelSet, counts: &[u64], note: Option<&str>) -> String {
    let mut line = String::from(" ");
    for (index, label) in labels.iter().enumerate() {
        line.push_str(&format!("[{}] {}:{:03}  ", index, label, counts[index]));
    }
    line.push_str("| q quit");
    if let Some(note) = note {
        line.push_str(" | ");
        line.push_str(note);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(list: &[&str]) -> LabelSet {
        LabelSet::new(list.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_status_line_lists_labels_and_counts() {
        let line = status_line(&labels(&["one", "two"]), &[0, 12], None);
        assert!(line.contains("[0] one:000"));
        assert!(line.contains("[1] two:012"));
        assert!(line.contains("q quit"));
    }

    #[test]
    fn test_status_line_includes_note() {
        let line = status_line(
            &labels(&["one"]),
            &[1],
            Some("saved Images/one-000.jpg"),
        );
        assert!(line.contains("saved Images/one-000.jpg"));
    }

    #[test]
    fn test_new_fails_fast_on_missing_source() {
        let options = CaptureOptions {
            selector: SourceSelector::File(PathBuf::from("/no/such/clip.mp4")),
            labels: labels(&["one"]),
            delay_ms: 1,
            output_dir: PathBuf::from("Images"),
            mirror: false,
            invert: false,
        };
        let result = CaptureController::new(options);
        assert!(matches!(result, Err(ControllerError::Source(_))));
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(format!("{}", StopReason::QuitKey), "quit key");
        assert_eq!(format!("{}", StopReason::EndOfStream), "end of stream");
        assert!(format!("{}", StopReason::ReadError("boom".to_string())).contains("boom"));
    }
}
