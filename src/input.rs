//! Keyboard input: bounded key waits and key classification.
//!
//! The capture loop never inspects raw key codes. Every key event is mapped
//! to a [`KeyAction`] here, which keeps the digit arithmetic and the quit
//! binding testable without a terminal.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press means to the capture loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Stop capturing and shut down
    Quit,
    /// Save the current frame under the label at this index
    Save(usize),
    /// Not bound to anything; continue with the next frame
    Ignore,
}

/// Classify a key event against a label set of the given size.
///
/// * `q` / `Q` quits. Ctrl+C also quits: raw mode disables SIGINT delivery,
///   so it arrives here as an ordinary key event.
/// * A digit `d` with `d < label_count` saves under label `d`.
/// * Everything else - out-of-range digits, other keys, release/repeat
///   events - is ignored.
pub fn classify_key(event: &KeyEvent, label_count: usize) -> KeyAction {
    if event.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }

    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::Quit,
            _ => KeyAction::Ignore,
        };
    }

    match event.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char(c) if c.is_ascii_digit() => {
            let index = (c as u8 - b'0') as usize;
            if index < label_count {
                KeyAction::Save(index)
            } else {
                KeyAction::Ignore
            }
        }
        _ => KeyAction::Ignore,
    }
}

/// Wait up to `delay_ms` milliseconds for a key event.
///
/// Returns `None` on timeout. A delay of 0 blocks until a key arrives,
/// which is the frame-stepping mode for video files: each frame stays on
/// screen until the operator presses something.
///
/// Non-key events (resize, focus, mouse) consume the wait and return `None`;
/// the loop simply moves on to the next frame.
pub fn wait_for_key(delay_ms: u64) -> io::Result<Option<KeyEvent>> {
    if delay_ms == 0 {
        loop {
            if let Event::Key(key) = event::read()? {
                return Ok(Some(key));
            }
        }
    }

    if event::poll(Duration::from_millis(delay_ms))? {
        match event::read()? {
            Event::Key(key) => Ok(Some(key)),
            _ => Ok(None),
        }
    } else {
        Ok(None)
    }
}
