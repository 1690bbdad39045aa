//! Video file backend: frames streamed from an ffmpeg subprocess.
//!
//! framegrab does not decode video itself. Dimensions are probed with
//! `ffprobe`, then `ffmpeg` is spawned to emit raw RGB24 frames on stdout,
//! which this module reads one frame-sized chunk at a time. A clean EOF on
//! the pipe is the end of the stream.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use super::{Frame, FrameRead, SourceError};

/// An ffmpeg child process decoding a video file to raw RGB24.
pub struct FileSource {
    child: Child,
    stdout: ChildStdout,
    stderr_thread: Option<JoinHandle<Vec<String>>>,
    path: PathBuf,
    width: u32,
    height: u32,
    frames_read: u64,
}

impl FileSource {
    /// Probe the file and spawn the decoder.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        if !path.is_file() {
            return Err(SourceError::FileNotFound(path.to_path_buf()));
        }

        let (width, height) = probe_dimensions(path)?;

        let mut child = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    SourceError::FfmpegNotFound("ffmpeg")
                } else {
                    SourceError::OpenFailed(format!("failed to spawn ffmpeg: {}", e))
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::OpenFailed("ffmpeg stdout unavailable".to_string()))?;

        // Drain stderr on a thread so ffmpeg never blocks on a full pipe.
        // Lines are kept for the error path and logged at debug level.
        let stderr = child.stderr.take();
        let stderr_thread = stderr.map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines() {
                    match line {
                        Ok(l) => {
                            log::debug!("[ffmpeg] {}", l);
                            lines.push(l);
                        }
                        Err(_) => break,
                    }
                }
                lines
            })
        });

        log::info!("opened {} at {}x{}", path.display(), width, height);

        Ok(Self {
            child,
            stdout,
            stderr_thread,
            path: path.to_path_buf(),
            width,
            height,
            frames_read: 0,
        })
    }

    /// Read the next frame-sized chunk from the decoder.
    pub fn read(&mut self) -> Result<FrameRead, SourceError> {
        let frame_len = self.width as usize * self.height as usize * 3;
        let mut data = vec![0u8; frame_len];

        match read_full(&mut self.stdout, &mut data) {
            Ok(true) => {
                self.frames_read += 1;
                Ok(FrameRead::Frame(Frame {
                    data,
                    width: self.width,
                    height: self.height,
                }))
            }
            Ok(false) => {
                log::info!(
                    "{}: end of stream after {} frames",
                    self.path.display(),
                    self.frames_read
                );
                Ok(FrameRead::EndOfStream)
            }
            Err(e) => Err(SourceError::ReadFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    pub fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

impl Drop for FileSource {
    fn drop(&mut self) {
        // The child may have exited on its own (EOF); kill is a no-op then.
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.stderr_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Fill `buf` completely from `reader`.
///
/// Returns `Ok(false)` on EOF at a frame boundary. EOF in the middle of a
/// frame (a truncated final frame) also ends the stream, but is logged since
/// it usually means the file is damaged.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled > 0 {
                    log::warn!("discarding truncated final frame ({} bytes)", filled);
                }
                return Ok(false);
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Ask ffprobe for the dimensions of the first video stream.
fn probe_dimensions(path: &Path) -> Result<(u32, u32), SourceError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0"])
        .args(["-show_entries", "stream=width,height"])
        .args(["-of", "csv=p=0"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SourceError::FfmpegNotFound("ffprobe")
            } else {
                SourceError::ProbeFailed {
                    path: path.to_path_buf(),
                    message: format!("failed to run ffprobe: {}", e),
                }
            }
        })?;

    if !output.status.success() {
        return Err(SourceError::ProbeFailed {
            path: path.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(stdout.trim()).ok_or_else(|| SourceError::ProbeFailed {
        path: path.to_path_buf(),
        message: format!("unexpected ffprobe output: '{}'", stdout.trim()),
    })
}

/// Parse ffprobe csv output of the form "WIDTH,HEIGHT".
fn parse_probe_output(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.split(',');
    let width: u32 = parts.next()?.trim().parse().ok()?;
    let height: u32 = parts.next()?.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}
